//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions,
//! TTL expirations, and memory-pressure cleanups.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
///
/// All counters increase monotonically for the lifetime of the instance;
/// only `reset()` (driven by `clear()`) zeroes them. Strategies that never
/// expire or pressure-evict simply leave those counters at zero.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted by capacity or pressure policy
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Number of memory-pressure eviction batches that ran
    pub memory_cleanups: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Expiration ==
    /// Increments the expiration counter.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Record Memory Cleanup ==
    /// Increments the memory cleanup counter (one per eviction batch).
    pub fn record_memory_cleanup(&mut self) {
        self.memory_cleanups += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }

    // == Reset ==
    /// Zeroes every counter. Used by `clear()`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
