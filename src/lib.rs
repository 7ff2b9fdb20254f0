//! Polycache - An adaptive multi-strategy in-memory cache
//!
//! Provides recency, expiry, and memory-pressure eviction strategies
//! behind one interface, with memoization, benchmarking, and a registry
//! that aggregates statistics across named instances.

pub mod bench;
pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod memory;
pub mod registry;
pub mod tasks;

pub use bench::{BenchmarkHarness, BenchmarkResult};
pub use cache::{Cache, CacheStats, ExpiryCache, PressureAwareCache, RecencyCache, Strategy};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use memo::{Memoized, Memoizer};
pub use registry::{CacheRegistry, RegistryReport, RegistrySummary};
