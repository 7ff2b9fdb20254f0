//! Expiry Cache Module
//!
//! Cache engine that bounds entry lifetime: every entry carries a TTL
//! (explicit or the configured default), enforced lazily on reads and
//! eagerly by a background reaper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheStats};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::memory::estimate_size;
use crate::tasks::{spawn_reaper_task, WorkerHandle};

// == Expiry Store ==
/// Entry store with TTL bookkeeping.
///
/// Synchronous; the owning cache serializes access through its lock.
#[derive(Debug)]
pub(crate) struct ExpiryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// TTL applied to entries stored without one
    default_ttl: Duration,
}

impl ExpiryStore {
    pub(crate) fn new(config: &CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl: config.default_ttl_duration(),
        }
    }

    // == Get ==
    /// Looks up a key. A read that finds an expired entry retires it on
    /// the spot, counting both an expiration and a miss.
    pub(crate) fn get(&mut self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch();
        self.stats.record_hit();
        Some(entry.value.clone())
    }

    // == Insert ==
    /// Stores a pre-serialized payload with a fresh timestamp.
    ///
    /// A `None` TTL falls back to the configured default, so every entry
    /// ends up with a bounded lifetime. Re-inserting a key restarts its
    /// clock.
    pub(crate) fn insert(
        &mut self,
        key: String,
        value: Value,
        ttl: Option<Duration>,
        size_bytes: usize,
    ) {
        let effective_ttl = ttl.unwrap_or(self.default_ttl);
        self.entries
            .insert(key, CacheEntry::new(value, Some(effective_ttl), size_bytes));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Sweep ==
    /// Removes every expired entry, counting one expiration per removal.
    ///
    /// Returns the number of entries removed. Called by the reaper.
    pub(crate) fn sweep(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.entries.remove(&key);
            self.stats.record_expiration();
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub(crate) fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Clear ==
    /// Empties the store and zeroes the statistics.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
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

// == Expiry Cache ==
/// Thread-safe expiry cache: an [`ExpiryStore`] behind an async lock,
/// plus the reaper task sweeping it in the background.
///
/// Call [`shutdown`](Self::shutdown) for a deterministic reaper stop;
/// merely dropping the cache aborts the task instead.
#[derive(Debug)]
pub struct ExpiryCache {
    store: Arc<RwLock<ExpiryStore>>,
    reaper: WorkerHandle,
}

impl ExpiryCache {
    // == Constructor ==
    /// Creates an expiry cache and starts its reaper.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(RwLock::new(ExpiryStore::new(config)));
        let reaper = spawn_reaper_task(Arc::clone(&store), config.sweep_interval());
        Ok(Self { store, reaper })
    }

    // == Get ==
    /// Retrieves a value by key, or None when absent or expired.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.store.write().await.get(key)
    }

    // == Put ==
    /// Stores a value with an optional per-entry TTL; `None` applies the
    /// configured default.
    ///
    /// Serialization runs before the lock is taken; a value that cannot
    /// be serialized leaves the store untouched.
    pub async fn put<V: Serialize>(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let size_bytes = estimate_size(&value);
        self.store
            .write()
            .await
            .insert(key.to_string(), value, ttl, size_bytes);
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

    // == Shutdown ==
    /// Stops the reaper and waits for it to finish.
    pub async fn shutdown(&self) {
        self.reaper.shutdown().await;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Reaper interval pushed out far enough that sweeps never interfere.
    fn lazy_only_config() -> CacheConfig {
        CacheConfig {
            sweep_interval_ms: 60_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_put_and_get_before_expiry() {
        let cache = ExpiryCache::new(&lazy_only_config()).unwrap();

        cache
            .put("key1", "value1", Some(Duration::from_secs(10)))
            .await
            .unwrap();

        assert_eq!(cache.get("key1").await, Some(json!("value1")));
        assert_eq!(cache.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_lazy_expiry_on_get() {
        let cache = ExpiryCache::new(&lazy_only_config()).unwrap();

        cache
            .put("key1", "value1", Some(Duration::from_millis(100)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        // The read itself retires the entry; no sweep has run.
        assert_eq!(cache.get("key1").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(cache.len().await, 0);

        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_on_next_access() {
        let cache = ExpiryCache::new(&lazy_only_config()).unwrap();

        cache.put("key1", "value1", Some(Duration::ZERO)).await.unwrap();

        assert_eq!(cache.get("key1").await, None);
        assert_eq!(cache.stats().await.expirations, 1);
    }

    #[tokio::test]
    async fn test_default_ttl_applies() {
        let config = CacheConfig {
            default_ttl: 1,
            sweep_interval_ms: 60_000,
            ..Default::default()
        };
        let cache = ExpiryCache::new(&config).unwrap();

        cache.put("key1", "value1", None).await.unwrap();
        assert!(cache.get("key1").await.is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(cache.get("key1").await, None);
        assert_eq!(cache.stats().await.expirations, 1);
    }

    #[tokio::test]
    async fn test_overwrite_restarts_the_clock() {
        let cache = ExpiryCache::new(&lazy_only_config()).unwrap();

        cache
            .put("key1", "v1", Some(Duration::from_millis(150)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        cache
            .put("key1", "v2", Some(Duration::from_millis(150)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // 200ms after the first put, but only 100ms into the second TTL.
        assert_eq!(cache.get("key1").await, Some(json!("v2")));
    }

    #[tokio::test]
    async fn test_reaper_convergence() {
        let config = CacheConfig {
            sweep_interval_ms: 50,
            ..Default::default()
        };
        let cache = ExpiryCache::new(&config).unwrap();

        for i in 0..10 {
            cache
                .put(&format!("key{}", i), i, Some(Duration::from_millis(50)))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(300)).await;

        // Every entry was swept without a single read.
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.stats().await.expirations, 10);

        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweeping() {
        let config = CacheConfig {
            sweep_interval_ms: 50,
            ..Default::default()
        };
        let cache = ExpiryCache::new(&config).unwrap();

        cache.shutdown().await;
        cache.put("key1", "v", Some(Duration::ZERO)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        // Expired but never swept; only a read would retire it now.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let cache = ExpiryCache::new(&lazy_only_config()).unwrap();

        cache.put("key1", 1, None).await.unwrap();
        cache.put("key2", 2, None).await.unwrap();

        assert!(cache.delete("key1").await);
        assert!(!cache.delete("key1").await);
        assert_eq!(cache.len().await, 1);

        cache.get("key2").await;
        cache.clear().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.stats().await.hits, 0);
    }
}
