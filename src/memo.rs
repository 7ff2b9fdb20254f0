//! Memoization Module
//!
//! Binds arbitrary computations to a cache instance, deriving stable
//! keys from call arguments and suppressing repeated work.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::Cache;
use crate::error::Result;

// == Function Stats ==
/// Per-wrapped-function counters.
///
/// Independent of the backing cache's own hit/miss statistics; both are
/// maintained, one per layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionStats {
    /// Total invocations of the wrapped computation
    pub calls: u64,
    /// Invocations answered from the cache
    pub cache_hits: u64,
    /// Invocations that had to run the computation
    pub cache_misses: u64,
}

/// A computation the layer can wrap: positional JSON arguments in,
/// JSON result out.
pub type Computation = dyn Fn(&[Value]) -> Value + Send + Sync;

/// Caller-supplied cache key derivation, overriding the default digest.
pub type KeyFn = dyn Fn(&[Value]) -> String + Send + Sync;

// == Key Derivation ==
/// Default cache key: the function's registered name plus a SHA-256
/// digest of the name and the canonical JSON form of the arguments.
///
/// serde_json keeps object keys sorted, so map-shaped arguments produce
/// the same key regardless of insertion order.
fn derive_key(name: &str, args: &[Value]) -> String {
    let canonical = serde_json::to_string(args).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    format!("{}:{}", name, hex::encode(hasher.finalize()))
}

// == Memoizer ==
/// Factory for memoized computations, all sharing one backing cache and
/// one per-function statistics map.
pub struct Memoizer {
    cache: Arc<Cache>,
    stats: Arc<RwLock<HashMap<String, FunctionStats>>>,
}

impl Memoizer {
    // == Constructor ==
    /// Binds the layer to one cache instance.
    pub fn new(cache: Arc<Cache>) -> Self {
        Self {
            cache,
            stats: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The cache backing every computation wrapped by this memoizer.
    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    // == Wrap ==
    /// Wraps a computation under `name` with default key derivation and
    /// no per-entry TTL.
    pub fn wrap<F>(&self, name: &str, computation: F) -> Memoized
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.wrap_with(name, computation, None, None)
    }

    /// Wraps a computation with full control over TTL and key derivation.
    ///
    /// The TTL only matters when the backing strategy understands entry
    /// lifetimes; a `key_fn` replaces the default digest entirely.
    pub fn wrap_with<F>(
        &self,
        name: &str,
        computation: F,
        ttl: Option<Duration>,
        key_fn: Option<Box<KeyFn>>,
    ) -> Memoized
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Memoized {
            name: name.to_string(),
            cache: Arc::clone(&self.cache),
            stats: Arc::clone(&self.stats),
            computation: Box::new(computation),
            ttl,
            key_fn,
        }
    }

    // == Stats Access ==
    /// Counters for one wrapped function, if it has been invoked.
    pub async fn function_stats(&self, name: &str) -> Option<FunctionStats> {
        self.stats.read().await.get(name).cloned()
    }

    /// Counters for every wrapped function invoked so far.
    pub async fn all_function_stats(&self) -> HashMap<String, FunctionStats> {
        self.stats.read().await.clone()
    }
}

impl std::fmt::Debug for Memoizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoizer")
            .field("strategy", &self.cache.strategy())
            .finish_non_exhaustive()
    }
}

// == Memoized ==
/// A computation bound to a cache.
///
/// Obtained through [`Memoizer::wrap`]; every call first consults the
/// cache and only runs the computation on a miss.
pub struct Memoized {
    name: String,
    cache: Arc<Cache>,
    stats: Arc<RwLock<HashMap<String, FunctionStats>>>,
    computation: Box<Computation>,
    ttl: Option<Duration>,
    key_fn: Option<Box<KeyFn>>,
}

impl Memoized {
    /// The name this computation was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    // == Call ==
    /// Invokes the wrapped computation, answering from the cache when a
    /// result for these arguments is already stored.
    ///
    /// Neither the key function nor the computation runs while a cache
    /// lock is held, so either may freely touch the same cache.
    pub async fn call(&self, args: &[Value]) -> Result<Value> {
        let key = match &self.key_fn {
            Some(key_fn) => key_fn(args),
            None => derive_key(&self.name, args),
        };

        if let Some(value) = self.cache.get(&key).await {
            self.record(true).await;
            debug!("Memoized result served for {}", self.name);
            return Ok(value);
        }

        self.record(false).await;
        let value = (self.computation)(args);
        self.cache.put(&key, &value, self.ttl).await?;
        Ok(value)
    }

    /// Updates this function's counters in one stats-lock acquisition.
    async fn record(&self, hit: bool) {
        let mut stats = self.stats.write().await;
        let entry = stats.entry(self.name.clone()).or_default();
        entry.calls += 1;
        if hit {
            entry.cache_hits += 1;
        } else {
            entry.cache_misses += 1;
        }
    }
}

impl std::fmt::Debug for Memoized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
