//! Error types for the document cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache, its backing stores and collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not present (in the cache or in the backing store)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Cache capacity must be at least one entry
    #[error("Invalid cache capacity: {0}")]
    InvalidCapacity(usize),

    /// Document key is empty or too long
    #[error("Invalid document key: {0}")]
    InvalidKey(String),

    /// Requested revision does not match the stored document
    #[error("Revision mismatch for {key}: expected {expected}, found {found}")]
    RevisionMismatch {
        key: String,
        expected: String,
        found: String,
    },

    /// Recency chain and index disagree
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Backing store failure
    #[error("Store error: {0}")]
    Store(String),
}

impl CacheError {
    /// Returns true for the expected "absent key" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the document cache.
pub type Result<T> = std::result::Result<T, CacheError>;
