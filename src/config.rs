//! Configuration Module
//!
//! Handles loading and validating cache configuration, either from
//! environment variables or from a deserialized options map.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Tuning parameters shared by all cache strategies.
///
/// Unknown fields in a deserialized options map are ignored, so callers
/// can pass a superset of options and let each strategy pick what it needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries a recency cache holds before evicting.
    pub max_size: usize,
    /// Soft limit on total stored bytes; exceeding it logs a warning.
    pub max_memory_bytes: Option<u64>,
    /// Fallback time-to-live in seconds for entries stored without one.
    pub default_ttl: u64,
    /// System memory utilization (percent) treated as the hard ceiling.
    pub max_memory_percent: f64,
    /// System memory utilization (percent) at which batch eviction starts.
    pub cleanup_threshold_percent: f64,
    /// How often the expiry reaper sweeps, in milliseconds.
    pub sweep_interval_ms: u64,
    /// How often the memory monitor samples, in milliseconds.
    pub monitor_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            max_memory_bytes: None,
            default_ttl: 300,
            max_memory_percent: 80.0,
            cleanup_threshold_percent: 70.0,
            sweep_interval_ms: 1_000,
            monitor_interval_ms: 1_000,
        }
    }
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables,
    /// falling back to defaults for anything unset or unparseable.
    ///
    /// # Environment Variables
    /// - `POLYCACHE_MAX_SIZE` - Entry capacity (default: 100)
    /// - `POLYCACHE_MAX_MEMORY_BYTES` - Soft byte limit (default: unset)
    /// - `POLYCACHE_DEFAULT_TTL` - Fallback TTL in seconds (default: 300)
    /// - `POLYCACHE_MAX_MEMORY_PERCENT` - Hard memory ceiling (default: 80)
    /// - `POLYCACHE_CLEANUP_THRESHOLD_PERCENT` - Eviction trigger (default: 70)
    /// - `POLYCACHE_SWEEP_INTERVAL_MS` - Reaper period (default: 1000)
    /// - `POLYCACHE_MONITOR_INTERVAL_MS` - Monitor period (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env::var("POLYCACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            max_memory_bytes: env::var("POLYCACHE_MAX_MEMORY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
            default_ttl: env::var("POLYCACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            max_memory_percent: env::var("POLYCACHE_MAX_MEMORY_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_memory_percent),
            cleanup_threshold_percent: env::var("POLYCACHE_CLEANUP_THRESHOLD_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_threshold_percent),
            sweep_interval_ms: env::var("POLYCACHE_SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval_ms),
            monitor_interval_ms: env::var("POLYCACHE_MONITOR_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.monitor_interval_ms),
        }
    }

    /// Checks that every parameter is usable, returning a descriptive error
    /// for the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::Configuration(
                "max_size must be at least 1".to_string(),
            ));
        }
        if !(self.max_memory_percent > 0.0 && self.max_memory_percent <= 100.0) {
            return Err(CacheError::Configuration(format!(
                "max_memory_percent must be in (0, 100], got {}",
                self.max_memory_percent
            )));
        }
        if !(self.cleanup_threshold_percent > 0.0 && self.cleanup_threshold_percent <= 100.0) {
            return Err(CacheError::Configuration(format!(
                "cleanup_threshold_percent must be in (0, 100], got {}",
                self.cleanup_threshold_percent
            )));
        }
        if self.sweep_interval_ms == 0 {
            return Err(CacheError::Configuration(
                "sweep_interval_ms must be positive".to_string(),
            ));
        }
        if self.monitor_interval_ms == 0 {
            return Err(CacheError::Configuration(
                "monitor_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Fallback TTL as a [`Duration`].
    pub fn default_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Reaper sweep period as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Memory monitor sample period as a [`Duration`].
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

// == Unit Tests ==
