//! Recency Cache Module
//!
//! Bounded-capacity cache engine that evicts the least recently used
//! entry once `max_size` is reached.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{AccessOrder, CacheEntry, CacheStats};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::memory::estimate_size;

// == Recency Store ==
/// Entry store plus recency bookkeeping.
///
/// Synchronous; the owning cache serializes access through its lock.
#[derive(Debug)]
pub(crate) struct RecencyStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Access-order tracker driving eviction
    order: AccessOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Soft byte bound; exceeding it only logs
    max_memory_bytes: Option<u64>,
    /// Running total of stored payload bytes
    total_bytes: u64,
}

impl RecencyStore {
    pub(crate) fn new(config: &CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            order: AccessOrder::new(),
            stats: CacheStats::new(),
            max_size: config.max_size,
            max_memory_bytes: config.max_memory_bytes,
            total_bytes: 0,
        }
    }

    // == Get ==
    /// Looks up a key, refreshing its recency position on a hit.
    pub(crate) fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.touch();
                let value = entry.value.clone();
                self.order.touch(key);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Insert ==
    /// Stores a pre-serialized payload, evicting from the least recently
    /// used end until the new entry fits under `max_size`.
    ///
    /// Re-inserting an existing key replaces its entry without counting
    /// an eviction.
    pub(crate) fn insert(&mut self, key: String, value: Value, size_bytes: usize) {
        if let Some(old) = self.entries.remove(&key) {
            self.order.forget(&key);
            self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes as u64);
        }

        while self.entries.len() >= self.max_size {
            match self.order.pop_least_recent() {
                Some(victim) => {
                    if let Some(old) = self.entries.remove(&victim) {
                        self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes as u64);
                        self.stats.record_eviction();
                        debug!("Evicted least recently used entry: {}", victim);
                    }
                }
                None => break,
            }
        }

        self.total_bytes += size_bytes as u64;
        self.entries
            .insert(key.clone(), CacheEntry::new(value, None, size_bytes));
        self.order.touch(&key);
        self.stats.set_total_entries(self.entries.len());

        if let Some(limit) = self.max_memory_bytes {
            if self.total_bytes > limit {
                warn!(
                    "Cache holds ~{} bytes, above the soft limit of {}",
                    self.total_bytes, limit
                );
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub(crate) fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(old) => {
                self.order.forget(key);
                self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes as u64);
                self.stats.set_total_entries(self.entries.len());
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Empties the store and zeroes the statistics.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
        self.stats.reset();
    }

    // == Stats ==
    /// Returns a snapshot of the statistics with a fresh entry count.
    pub(crate) fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Recency Cache ==
/// Thread-safe recency cache: a [`RecencyStore`] behind an async lock.
///
/// Share between tasks by wrapping in an `Arc`.
#[derive(Debug)]
pub struct RecencyCache {
    store: Arc<RwLock<RecencyStore>>,
}

impl RecencyCache {
    // == Constructor ==
    /// Creates a recency cache after validating the configuration.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(RwLock::new(RecencyStore::new(config))),
        })
    }

    // == Get ==
    /// Retrieves a value by key, or None on a miss.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.store.write().await.get(key)
    }

    // == Put ==
    /// Stores a value, evicting stale entries if the cache is full.
    ///
    /// Serialization and size estimation run before the lock is taken;
    /// a value that cannot be serialized leaves the store untouched.
    pub async fn put<V: Serialize>(&self, key: &str, value: V) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let size_bytes = estimate_size(&value);
        self.store.write().await.insert(key.to_string(), value, size_bytes);
        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    // == Clear ==
    /// Empties the cache and resets its statistics.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    // == Stats ==
    /// Returns a statistics snapshot.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    // == Length ==
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}
