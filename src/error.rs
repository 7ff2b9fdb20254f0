//! Error types for the caching library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache creation and storage operations.
///
/// A cache `get` miss is not an error; lookups return `Option` instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Strategy name not one of the known strategies
    #[error("Unknown cache strategy: {0}")]
    InvalidStrategy(String),

    /// Value could not be serialized for storage or size estimation
    #[error("Value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Out-of-range or inconsistent configuration value
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// No cache registered under the given name
    #[error("Unknown cache: {0}")]
    UnknownCache(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
