//! Strategy Module
//!
//! The closed set of eviction strategies and the tagged dispatcher that
//! gives every concrete engine one shared surface.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CacheStats, ExpiryCache, PressureAwareCache, RecencyCache};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Strategy ==
/// Identifies one of the three eviction strategies.
///
/// Being a closed enum, every dispatch site matches exhaustively; string
/// input only enters through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Bounded capacity, least-recently-used eviction
    Recency,
    /// Per-entry TTL with background reaping
    Expiry,
    /// Batch eviction under system memory pressure
    Pressure,
}

impl Strategy {
    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Recency => "recency",
            Strategy::Expiry => "expiry",
            Strategy::Pressure => "pressure",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "recency" => Ok(Strategy::Recency),
            "expiry" => Ok(Strategy::Expiry),
            "pressure" => Ok(Strategy::Pressure),
            other => Err(CacheError::InvalidStrategy(other.to_string())),
        }
    }
}

// == Cache ==
/// A cache instance backed by one concrete strategy.
///
/// Callers that know their strategy at compile time can use the concrete
/// types directly; this wrapper exists for registry-driven code that
/// picks the strategy at runtime.
#[derive(Debug)]
pub enum Cache {
    Recency(RecencyCache),
    Expiry(ExpiryCache),
    Pressure(PressureAwareCache),
}

impl Cache {
    // == Constructor ==
    /// Builds a cache of the given strategy from a shared configuration.
    pub fn new(strategy: Strategy, config: &CacheConfig) -> Result<Self> {
        Ok(match strategy {
            Strategy::Recency => Cache::Recency(RecencyCache::new(config)?),
            Strategy::Expiry => Cache::Expiry(ExpiryCache::new(config)?),
            Strategy::Pressure => Cache::Pressure(PressureAwareCache::new(config)?),
        })
    }

    // == Strategy ==
    /// Which strategy backs this instance.
    pub fn strategy(&self) -> Strategy {
        match self {
            Cache::Recency(_) => Strategy::Recency,
            Cache::Expiry(_) => Strategy::Expiry,
            Cache::Pressure(_) => Strategy::Pressure,
        }
    }

    // == Get ==
    /// Retrieves a value by key, or None on a miss.
    pub async fn get(&self, key: &str) -> Option<Value> {
        match self {
            Cache::Recency(cache) => cache.get(key).await,
            Cache::Expiry(cache) => cache.get(key).await,
            Cache::Pressure(cache) => cache.get(key).await,
        }
    }

    // == Put ==
    /// Stores a value. The TTL reaches the strategies that understand
    /// lifetimes; the recency strategy ignores it.
    pub async fn put<V: Serialize>(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
    ) -> Result<()> {
        match self {
            Cache::Recency(cache) => cache.put(key, value).await,
            Cache::Expiry(cache) => cache.put(key, value, ttl).await,
            Cache::Pressure(cache) => cache.put(key, value, ttl).await,
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub async fn delete(&self, key: &str) -> bool {
        match self {
            Cache::Recency(cache) => cache.delete(key).await,
            Cache::Expiry(cache) => cache.delete(key).await,
            Cache::Pressure(cache) => cache.delete(key).await,
        }
    }

    // == Clear ==
    /// Empties the cache and resets its statistics.
    pub async fn clear(&self) {
        match self {
            Cache::Recency(cache) => cache.clear().await,
            Cache::Expiry(cache) => cache.clear().await,
            Cache::Pressure(cache) => cache.clear().await,
        }
    }

    // == Stats ==
    /// Returns a statistics snapshot.
    pub async fn stats(&self) -> CacheStats {
        match self {
            Cache::Recency(cache) => cache.stats().await,
            Cache::Expiry(cache) => cache.stats().await,
            Cache::Pressure(cache) => cache.stats().await,
        }
    }

    // == Length ==
    pub async fn len(&self) -> usize {
        match self {
            Cache::Recency(cache) => cache.len().await,
            Cache::Expiry(cache) => cache.len().await,
            Cache::Pressure(cache) => cache.len().await,
        }
    }

    pub async fn is_empty(&self) -> bool {
        match self {
            Cache::Recency(cache) => cache.is_empty().await,
            Cache::Expiry(cache) => cache.is_empty().await,
            Cache::Pressure(cache) => cache.is_empty().await,
        }
    }

    // == Shutdown ==
    /// Stops any background worker the strategy runs. A no-op for the
    /// recency strategy, which has none.
    pub async fn shutdown(&self) {
        match self {
            Cache::Recency(_) => {}
            Cache::Expiry(cache) => cache.shutdown().await,
            Cache::Pressure(cache) => cache.shutdown().await,
        }
    }
}
