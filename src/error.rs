//! Error types for cache and backing store operations
//!
//! `CacheError` is what callers of the coordinator see. Failures coming out of
//! the backing store are carried as `StoreError` and surface unchanged through
//! `CacheError::Store`.

use thiserror::Error;

/// Main error type for cache coordinator operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// The request carries no discriminating information or is otherwise unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A value found in the cache could not be interpreted as a cached entry
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error raised by the backing store, propagated verbatim
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error type for backing store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No record matched the criteria
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Query execution error
    #[error("Query error: {0}")]
    QueryError(String),

    /// Write (save/upsert) error
    #[error("Write error: {0}")]
    WriteError(String),

    /// Connection error - network or handle issues
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Operation timeout
    #[error("Operation timed out after {timeout_seconds}s: {context}")]
    TimeoutError {
        timeout_seconds: u64,
        context: String,
    },

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type alias for backing store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<String> for StoreError {
    fn from(s: String) -> Self {
        StoreError::Other(s)
    }
}

impl From<&str> for StoreError {
    fn from(s: &str) -> Self {
        StoreError::Other(s.to_string())
    }
}

impl CacheError {
    /// Returns the backing store error if this error came from the store
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            CacheError::Store(e) => Some(e),
            _ => None,
        }
    }
}
