//! Registry Module
//!
//! Creates and owns named cache and memoizer instances, aggregates
//! their statistics, and produces a unified serializable report.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::bench::{BenchmarkHarness, BenchmarkResult};
use crate::cache::{Cache, CacheStats, Strategy};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::memo::{FunctionStats, Memoizer};

// == Report Types ==

/// One cache's contribution to a report.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReportEntry {
    pub strategy: Strategy,
    pub stats: CacheStats,
}

/// Registry-wide aggregate counters.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySummary {
    pub total_caches: usize,
    pub total_entries: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    /// `total_hits / (total_hits + total_misses)`, 0 with no requests
    pub overall_hit_rate: f64,
}

/// Full snapshot of everything the registry knows.
///
/// Plain serializable data; turning it into files or any downstream
/// format is the caller's concern.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryReport {
    /// Per-cache statistics, keyed by registered name
    pub caches: BTreeMap<String, CacheReportEntry>,
    /// Per-memoizer, per-function counters
    pub functions: BTreeMap<String, BTreeMap<String, FunctionStats>>,
    /// Every benchmark result recorded so far
    pub benchmarks: Vec<BenchmarkResult>,
    pub summary: RegistrySummary,
    pub generated_at: DateTime<Utc>,
}

// == Cache Registry ==
/// Orchestrator owning named caches, memoizers, and a benchmark harness.
///
/// A plain value with no global state: independent registries coexist
/// freely, which tests rely on.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    caches: RwLock<HashMap<String, Arc<Cache>>>,
    memoizers: RwLock<HashMap<String, Arc<Memoizer>>>,
    harness: BenchmarkHarness,
}

impl CacheRegistry {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Create Cache ==
    /// Creates a cache under `name`, replacing any prior binding.
    ///
    /// A replaced instance is only detached: handles already held keep
    /// working, and its background workers keep running until those
    /// handles shut it down or drop it.
    pub async fn create_cache(
        &self,
        name: &str,
        strategy: Strategy,
        config: &CacheConfig,
    ) -> Result<Arc<Cache>> {
        let cache = Arc::new(Cache::new(strategy, config)?);
        let prior = self
            .caches
            .write()
            .await
            .insert(name.to_string(), Arc::clone(&cache));

        if prior.is_some() {
            debug!("Detached previous cache bound to {}", name);
        }
        info!("Created {} cache: {}", strategy, name);
        Ok(cache)
    }

    // == Create Memoized ==
    /// Creates a memoizer under `name`, backed by a fresh cache of the
    /// given strategy registered under the same name.
    pub async fn create_memoized(
        &self,
        name: &str,
        strategy: Strategy,
        config: &CacheConfig,
    ) -> Result<Arc<Memoizer>> {
        let cache = self.create_cache(name, strategy, config).await?;
        let memoizer = Arc::new(Memoizer::new(cache));
        self.memoizers
            .write()
            .await
            .insert(name.to_string(), Arc::clone(&memoizer));
        Ok(memoizer)
    }

    // == Lookups ==
    /// The cache bound to `name`, if any.
    pub async fn get_cache(&self, name: &str) -> Option<Arc<Cache>> {
        self.caches.read().await.get(name).cloned()
    }

    /// The memoizer bound to `name`, if any.
    pub async fn get_memoizer(&self, name: &str) -> Option<Arc<Memoizer>> {
        self.memoizers.read().await.get(name).cloned()
    }

    // == Benchmarking ==
    /// The registry's harness, for driving caches it does not own.
    pub fn harness(&self) -> &BenchmarkHarness {
        &self.harness
    }

    /// Benchmarks the cache bound to `name`.
    pub async fn benchmark(
        &self,
        name: &str,
        dataset: &[(String, Value)],
        iterations: usize,
    ) -> Result<BenchmarkResult> {
        let cache = self
            .get_cache(name)
            .await
            .ok_or_else(|| CacheError::UnknownCache(name.to_string()))?;
        self.harness.run(name, &cache, dataset, iterations).await
    }

    // == Summary ==
    /// Aggregates hit/miss/entry counts over every registered cache.
    pub async fn summary(&self) -> RegistrySummary {
        let caches = self.caches.read().await;

        let mut total_entries = 0;
        let mut total_hits = 0;
        let mut total_misses = 0;
        for cache in caches.values() {
            let stats = cache.stats().await;
            total_entries += stats.total_entries;
            total_hits += stats.hits;
            total_misses += stats.misses;
        }

        let requests = total_hits + total_misses;
        let overall_hit_rate = if requests == 0 {
            0.0
        } else {
            total_hits as f64 / requests as f64
        };

        RegistrySummary {
            total_caches: caches.len(),
            total_entries,
            total_hits,
            total_misses,
            overall_hit_rate,
        }
    }

    // == Report ==
    /// Builds the full snapshot: per-cache stats, per-function stats,
    /// benchmark history, and the aggregate summary.
    pub async fn report(&self) -> RegistryReport {
        let mut cache_entries = BTreeMap::new();
        {
            let caches = self.caches.read().await;
            for (name, cache) in caches.iter() {
                cache_entries.insert(
                    name.clone(),
                    CacheReportEntry {
                        strategy: cache.strategy(),
                        stats: cache.stats().await,
                    },
                );
            }
        }

        let mut functions = BTreeMap::new();
        {
            let memoizers = self.memoizers.read().await;
            for (name, memoizer) in memoizers.iter() {
                let per_function: BTreeMap<String, FunctionStats> =
                    memoizer.all_function_stats().await.into_iter().collect();
                functions.insert(name.clone(), per_function);
            }
        }

        RegistryReport {
            caches: cache_entries,
            functions,
            benchmarks: self.harness.history().await,
            summary: self.summary().await,
            generated_at: Utc::now(),
        }
    }

    // == Shutdown ==
    /// Stops the background workers of every registered cache.
    pub async fn shutdown(&self) {
        let caches: Vec<Arc<Cache>> = self.caches.read().await.values().cloned().collect();
        for cache in caches {
            cache.shutdown().await;
        }
    }
}
