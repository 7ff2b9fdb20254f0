//! Cache Entry Module
//!
//! Defines the structure for individual cache entries: the stored payload
//! plus the timing and access metadata every eviction strategy reads.

use std::time::{Duration, Instant};

use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with payload and metadata.
///
/// Timestamps are monotonic (`Instant`), so entry age and recency
/// comparisons are immune to wall-clock adjustments.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Value,
    /// When the entry was created
    pub created_at: Instant,
    /// When the entry was last read or written
    pub last_accessed: Instant,
    /// Number of accesses, starting at 1 for the insert itself
    pub access_count: u64,
    /// Time-to-live measured from `created_at`, None = never expires
    pub ttl: Option<Duration>,
    /// Estimated serialized size of the payload in bytes
    pub size_bytes: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL and a precomputed
    /// size estimate.
    pub fn new(value: Value, ttl: Option<Duration>, size_bytes: usize) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            last_accessed: now,
            access_count: 1,
            ttl,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once its full TTL has
    /// elapsed (`elapsed >= ttl`), so a zero TTL is eligible for expiry
    /// on the very next access or sweep.
    pub fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.created_at.elapsed() >= ttl,
            None => false,
        }
    }

    // == Touch ==
    /// Records a successful read: refreshes `last_accessed` and bumps
    /// `access_count`.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
        self.access_count += 1;
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// Saturates at zero once the TTL has elapsed.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.ttl
            .map(|ttl| ttl.saturating_sub(self.created_at.elapsed()))
    }
}
