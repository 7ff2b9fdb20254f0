//! Benchmark Module
//!
//! Drives read and write workloads against a cache instance, measures
//! throughput, and keeps every result in an append-only history.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{Cache, CacheStats};
use crate::error::Result;

// == Benchmark Result ==
/// Outcome of one benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    /// Label of the cache that was driven
    pub name: String,
    /// Wall-clock duration of the read passes, in seconds
    pub read_time_secs: f64,
    /// Wall-clock duration of the write passes, in seconds
    pub write_time_secs: f64,
    pub read_ops_per_sec: f64,
    pub write_ops_per_sec: f64,
    /// Statistics snapshot taken right after the run
    pub cache_stats: CacheStats,
    /// When the run finished
    pub timestamp: DateTime<Utc>,
}

// == Benchmark Harness ==
/// Runs benchmarks and accumulates their results.
#[derive(Debug, Default)]
pub struct BenchmarkHarness {
    history: RwLock<Vec<BenchmarkResult>>,
}

impl BenchmarkHarness {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Run ==
    /// Benchmarks `cache` under the label `name`: warms it by inserting
    /// every pair in `dataset` once, then times `iterations` read-only
    /// passes followed by `iterations` write-only passes.
    ///
    /// Throughput is `iterations * dataset.len() / elapsed`, reported as
    /// 0 when the elapsed time is unmeasurably small.
    pub async fn run(
        &self,
        name: &str,
        cache: &Cache,
        dataset: &[(String, Value)],
        iterations: usize,
    ) -> Result<BenchmarkResult> {
        // Warm-up, so the read passes measure resident keys.
        for (key, value) in dataset {
            cache.put(key, value, None).await?;
        }

        let ops_per_phase = (iterations * dataset.len()) as f64;

        let read_start = Instant::now();
        for _ in 0..iterations {
            for (key, _) in dataset {
                let _ = cache.get(key).await;
            }
        }
        let read_time_secs = read_start.elapsed().as_secs_f64();

        let write_start = Instant::now();
        for _ in 0..iterations {
            for (key, value) in dataset {
                cache.put(key, value, None).await?;
            }
        }
        let write_time_secs = write_start.elapsed().as_secs_f64();

        let result = BenchmarkResult {
            name: name.to_string(),
            read_time_secs,
            write_time_secs,
            read_ops_per_sec: ops_per_sec(ops_per_phase, read_time_secs),
            write_ops_per_sec: ops_per_sec(ops_per_phase, write_time_secs),
            cache_stats: cache.stats().await,
            timestamp: Utc::now(),
        };

        info!(
            "Benchmark {}: {:.0} reads/s, {:.0} writes/s",
            name, result.read_ops_per_sec, result.write_ops_per_sec
        );

        self.history.write().await.push(result.clone());
        Ok(result)
    }

    // == History ==
    /// Every result recorded so far, oldest first.
    pub async fn history(&self) -> Vec<BenchmarkResult> {
        self.history.read().await.clone()
    }
}

// == Throughput ==
/// Division guard: zero elapsed time reports zero throughput.
fn ops_per_sec(total_ops: f64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        total_ops / elapsed_secs
    } else {
        0.0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Strategy;
    use crate::config::CacheConfig;
    use serde_json::json;

    fn sample_dataset(pairs: usize) -> Vec<(String, Value)> {
        (0..pairs)
            .map(|i| (format!("key{}", i), json!({ "index": i })))
            .collect()
    }

    #[tokio::test]
    async fn test_run_yields_positive_throughput() {
        let harness = BenchmarkHarness::new();
        let cache = Cache::new(Strategy::Recency, &CacheConfig::default()).unwrap();

        let result = harness
            .run("recency", &cache, &sample_dataset(10), 3)
            .await
            .unwrap();

        assert!(result.read_ops_per_sec > 0.0);
        assert!(result.write_ops_per_sec > 0.0);
        assert!(result.read_time_secs >= 0.0);
        assert!(result.write_time_secs >= 0.0);
    }

    #[tokio::test]
    async fn test_run_snapshots_cache_stats() {
        let harness = BenchmarkHarness::new();
        let cache = Cache::new(Strategy::Recency, &CacheConfig::default()).unwrap();

        let result = harness
            .run("recency", &cache, &sample_dataset(10), 3)
            .await
            .unwrap();

        // Every read pass hits: the dataset fits the cache after warm-up.
        assert_eq!(result.cache_stats.hits, 30);
        assert_eq!(result.cache_stats.misses, 0);
        assert_eq!(result.cache_stats.total_entries, 10);
    }

    #[tokio::test]
    async fn test_history_appends_in_order() {
        let harness = BenchmarkHarness::new();
        let cache = Cache::new(Strategy::Recency, &CacheConfig::default()).unwrap();
        let dataset = sample_dataset(5);

        harness.run("first", &cache, &dataset, 1).await.unwrap();
        harness.run("second", &cache, &dataset, 1).await.unwrap();

        let history = harness.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].name, "first");
        assert_eq!(history[1].name, "second");
        assert!(history[0].timestamp <= history[1].timestamp);
    }

    #[tokio::test]
    async fn test_run_against_expiry_strategy() {
        let harness = BenchmarkHarness::new();
        let cache = Cache::new(Strategy::Expiry, &CacheConfig::default()).unwrap();

        let result = harness
            .run("expiry", &cache, &sample_dataset(5), 2)
            .await
            .unwrap();

        assert!(result.read_ops_per_sec > 0.0);
        cache.shutdown().await;
    }

    #[test]
    fn test_ops_per_sec_guards_zero_elapsed() {
        assert_eq!(ops_per_sec(100.0, 0.0), 0.0);
        assert!(ops_per_sec(100.0, 2.0) == 50.0);
    }

    #[tokio::test]
    async fn test_result_serializes() {
        let harness = BenchmarkHarness::new();
        let cache = Cache::new(Strategy::Recency, &CacheConfig::default()).unwrap();

        let result = harness
            .run("recency", &cache, &sample_dataset(3), 1)
            .await
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["name"], "recency");
        assert!(json["timestamp"].is_string());
    }
}
