//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// A missing key is not an error: `fetch` returns `Ok(None)` and `delete`
/// returns `false`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A required argument was empty, oversized or unrecognised
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Storing the value would push the cache past its size budget
    #[error("Capacity exceeded: storing {requested} bytes with {used} of {max} bytes in use")]
    CapacityExceeded {
        /// Serialized size of the rejected value
        requested: u64,
        /// Bytes in use when the store was attempted
        used: u64,
        /// Configured ceiling
        max: u64,
    },

    /// The stored value cannot be viewed as the requested type
    #[error("Invalid type {expected} for value under key '{key}': {reason}")]
    TypeMismatch {
        /// Key the value was fetched under
        key: String,
        /// Name of the requested type
        expected: &'static str,
        /// Decoder message describing the mismatch
        reason: String,
    },

    /// The value could not be serialized
    #[error("Encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// An export sink rejected a record
    #[error("Export failed at entry {index}: {source}")]
    Export {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
