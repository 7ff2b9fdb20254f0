//! Pressure-Aware Cache Module
//!
//! Cache engine that reacts to system memory pressure: writes above a
//! soft utilization threshold evict a batch of cold entries first, and a
//! background monitor does the same whenever utilization crosses the
//! hard ceiling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::memory::{estimate_size, MemoryProbe, SystemMemoryProbe};
use crate::tasks::{spawn_monitor_task, WorkerHandle};

// == Pressure Store ==
/// Entry store with batch eviction for memory pressure.
///
/// Synchronous; the owning cache serializes access through its lock.
#[derive(Debug, Default)]
pub(crate) struct PressureStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
}

impl PressureStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Looks up a key. An entry stored with a TTL reads as a plain miss
    /// once that TTL elapses; expiration accounting belongs to the
    /// expiry strategy.
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
    /// Stores a pre-serialized payload. The TTL is kept as given; this
    /// strategy applies no default lifetime.
    pub(crate) fn insert(
        &mut self,
        key: String,
        value: Value,
        ttl: Option<Duration>,
        size_bytes: usize,
    ) {
        self.entries
            .insert(key, CacheEntry::new(value, ttl, size_bytes));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Evict Batch ==
    /// Removes the coldest fifth of the store (minimum one entry),
    /// ordered ascending by `(last_accessed, access_count)`.
    ///
    /// Counts one eviction per removed entry and one memory cleanup per
    /// non-empty batch. Returns the number of entries removed.
    pub(crate) fn evict_batch(&mut self) -> usize {
        if self.entries.is_empty() {
            return 0;
        }

        let mut candidates: Vec<(String, Instant, u64)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.last_accessed, entry.access_count))
            .collect();
        candidates.sort_by_key(|(_, last_accessed, access_count)| (*last_accessed, *access_count));

        let batch_size = ((self.entries.len() + 4) / 5).max(1);
        let mut removed = 0;
        for (key, _, _) in candidates.into_iter().take(batch_size) {
            if self.entries.remove(&key).is_some() {
                self.stats.record_eviction();
                removed += 1;
            }
        }

        if removed > 0 {
            self.stats.record_memory_cleanup();
        }
        self.stats.set_total_entries(self.entries.len());
        removed
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

// == Pressure-Aware Cache ==
/// Thread-safe pressure-aware cache: a [`PressureStore`] behind an async
/// lock, a memory probe, and the background monitor task.
///
/// Call [`shutdown`](Self::shutdown) for a deterministic monitor stop;
/// merely dropping the cache aborts the task instead.
pub struct PressureAwareCache {
    store: Arc<RwLock<PressureStore>>,
    probe: Arc<dyn MemoryProbe>,
    cleanup_threshold_percent: f64,
    monitor: WorkerHandle,
}

impl PressureAwareCache {
    // == Constructors ==
    /// Creates a pressure-aware cache reading real system memory.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Self::with_probe(config, Arc::new(SystemMemoryProbe::new()))
    }

    /// Creates a pressure-aware cache with a caller-supplied probe.
    ///
    /// Tests use this with a fixed probe to drive eviction on demand.
    pub fn with_probe(config: &CacheConfig, probe: Arc<dyn MemoryProbe>) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(RwLock::new(PressureStore::new()));
        let monitor = spawn_monitor_task(
            Arc::clone(&store),
            Arc::clone(&probe),
            config.max_memory_percent,
            config.monitor_interval(),
        );
        Ok(Self {
            store,
            probe,
            cleanup_threshold_percent: config.cleanup_threshold_percent,
            monitor,
        })
    }

    // == Get ==
    /// Retrieves a value by key, or None when absent or past its TTL.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.store.write().await.get(key)
    }

    // == Put ==
    /// Stores a value with an optional TTL, evicting a batch of cold
    /// entries first when memory utilization is above the soft threshold.
    ///
    /// Serialization and the probe read both happen before the lock is
    /// taken; a value that cannot be serialized leaves the store
    /// untouched.
    pub async fn put<V: Serialize>(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let size_bytes = estimate_size(&value);

        let over_threshold = self
            .probe
            .utilization_percent()
            .map(|pct| pct > self.cleanup_threshold_percent)
            .unwrap_or(false);

        let mut store = self.store.write().await;
        if over_threshold {
            let evicted = store.evict_batch();
            if evicted > 0 {
                debug!("Memory pressure: evicted {} entries before insert", evicted);
            }
        }
        store.insert(key.to_string(), value, ttl, size_bytes);
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
    /// Stops the monitor and waits for it to finish.
    pub async fn shutdown(&self) {
        self.monitor.shutdown().await;
    }
}

impl std::fmt::Debug for PressureAwareCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PressureAwareCache")
            .field("cleanup_threshold_percent", &self.cleanup_threshold_percent)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FixedMemoryProbe;
    use serde_json::json;
    use std::sync::Mutex;

    /// Probe whose reading tests can change mid-flight.
    #[derive(Clone)]
    struct AdjustableProbe {
        utilization: Arc<Mutex<f64>>,
    }

    impl AdjustableProbe {
        fn new(initial: f64) -> Self {
            Self {
                utilization: Arc::new(Mutex::new(initial)),
            }
        }

        fn set(&self, pct: f64) {
            *self.utilization.lock().unwrap() = pct;
        }
    }

    impl MemoryProbe for AdjustableProbe {
        fn utilization_percent(&self) -> Option<f64> {
            Some(*self.utilization.lock().unwrap())
        }
    }

    /// Monitor interval pushed out so only `put` drives eviction.
    fn put_only_config() -> CacheConfig {
        CacheConfig {
            monitor_interval_ms: 60_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_put_and_get_without_pressure() {
        let cache =
            PressureAwareCache::with_probe(&put_only_config(), Arc::new(FixedMemoryProbe(10.0)))
                .unwrap();

        cache.put("key1", "value1", None).await.unwrap();

        assert_eq!(cache.get("key1").await, Some(json!("value1")));
        assert_eq!(cache.stats().await.evictions, 0);
        assert_eq!(cache.stats().await.memory_cleanups, 0);
    }

    #[tokio::test]
    async fn test_put_under_pressure_evicts_batch() {
        let probe = AdjustableProbe::new(10.0);
        let cache =
            PressureAwareCache::with_probe(&put_only_config(), Arc::new(probe.clone())).unwrap();

        for i in 0..10 {
            cache.put(&format!("key{}", i), i, None).await.unwrap();
        }
        assert_eq!(cache.len().await, 10);

        // Pressure appears; the next put clears a fifth of the store first.
        probe.set(90.0);
        cache.put("key10", 10, None).await.unwrap();

        let stats = cache.stats().await;
        assert_eq!(cache.len().await, 9); // 10 - 2 + 1
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.memory_cleanups, 1);
        assert_eq!(cache.get("key10").await, Some(json!(10)));
    }

    #[tokio::test]
    async fn test_eviction_prefers_stale_entries() {
        let probe = AdjustableProbe::new(10.0);
        let cache =
            PressureAwareCache::with_probe(&put_only_config(), Arc::new(probe.clone())).unwrap();

        cache.put("a", 1, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.put("b", 2, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.put("c", 3, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Refresh everything except "a".
        cache.get("b").await;
        cache.get("c").await;

        probe.set(90.0);
        cache.put("d", 4, None).await.unwrap();

        // Batch of ceil(3/5) = 1: the stalest entry goes.
        assert_eq!(cache.get("a").await, None);
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());
        assert!(cache.get("d").await.is_some());
    }

    #[tokio::test]
    async fn test_ttl_read_counts_miss_only() {
        let cache =
            PressureAwareCache::with_probe(&put_only_config(), Arc::new(FixedMemoryProbe(10.0)))
                .unwrap();

        cache
            .put("key1", "value1", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("key1").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 0);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_untimed_entries_never_expire() {
        let cache =
            PressureAwareCache::with_probe(&put_only_config(), Arc::new(FixedMemoryProbe(10.0)))
                .unwrap();

        cache.put("key1", "value1", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(cache.get("key1").await.is_some());
    }

    #[tokio::test]
    async fn test_probe_failure_reads_as_no_pressure() {
        struct BrokenProbe;
        impl MemoryProbe for BrokenProbe {
            fn utilization_percent(&self) -> Option<f64> {
                None
            }
        }

        let cache =
            PressureAwareCache::with_probe(&put_only_config(), Arc::new(BrokenProbe)).unwrap();

        cache.put("key1", 1, None).await.unwrap();
        cache.put("key2", 2, None).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.stats().await.memory_cleanups, 0);
    }

    #[tokio::test]
    async fn test_serialization_failure_leaves_store_untouched() {
        use serde::Serializer;

        struct Unserializable;
        impl Serialize for Unserializable {
            fn serialize<S: Serializer>(
                &self,
                _serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("refuses to serialize"))
            }
        }

        let cache =
            PressureAwareCache::with_probe(&put_only_config(), Arc::new(FixedMemoryProbe(10.0)))
                .unwrap();

        cache.put("key1", "value1", None).await.unwrap();
        assert!(cache.put("key1", Unserializable, None).await.is_err());

        assert_eq!(cache.get("key1").await, Some(json!("value1")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_monitor() {
        let config = CacheConfig {
            monitor_interval_ms: 20,
            ..Default::default()
        };
        let probe = AdjustableProbe::new(10.0);
        let cache = PressureAwareCache::with_probe(&config, Arc::new(probe.clone())).unwrap();

        cache.put("key1", 1, None).await.unwrap();
        cache.put("key2", 2, None).await.unwrap();
        cache.shutdown().await;

        // Pressure appearing after shutdown changes nothing; nobody samples.
        probe.set(95.0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.stats().await.memory_cleanups, 0);
    }

    #[test]
    fn test_batch_size_is_a_fifth_rounded_up() {
        let mut store = PressureStore::new();
        for i in 0..7 {
            store.insert(format!("key{}", i), json!(i), None, 4);
        }

        // ceil(7/5) = 2
        assert_eq!(store.evict_batch(), 2);
        assert_eq!(store.len(), 5);

        // ceil(5/5) = 1
        assert_eq!(store.evict_batch(), 1);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_batch_on_empty_store_is_noop() {
        let mut store = PressureStore::new();
        assert_eq!(store.evict_batch(), 0);
        assert_eq!(store.stats().memory_cleanups, 0);
    }
}
