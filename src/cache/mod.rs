//! Cache Module
//!
//! Provides the three in-memory caching engines (recency, expiry,
//! pressure) plus the strategy dispatcher that unifies them.

mod entry;
mod expiry;
mod order;
mod pressure;
mod recency;
mod stats;
mod strategy;


// Re-export public types
pub use entry::CacheEntry;
pub use expiry::ExpiryCache;
pub use order::AccessOrder;
pub use pressure::PressureAwareCache;
pub use recency::RecencyCache;
pub use stats::CacheStats;
pub use strategy::{Cache, Strategy};

// Stores stay crate-internal; the background tasks sweep them directly.
pub(crate) use expiry::ExpiryStore;
pub(crate) use pressure::PressureStore;
#[cfg(test)]
pub(crate) use recency::RecencyStore;
