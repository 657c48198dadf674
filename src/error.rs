//! Error types for the cache
//!
//! Cache operations report misses and rejections through their return
//! values; only configuration loading can fail.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// A configuration value could not be parsed
    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidConfig {
        name: &'static str,
        value: String,
        reason: String,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
