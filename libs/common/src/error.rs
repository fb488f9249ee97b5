//! Custom error types for the common library
//!
//! This module defines the storage error types shared by every storage
//! tier used by the clients.

use thiserror::Error;

/// Custom error type for key/value storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store is disabled or not present on this platform
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Error occurred while reading or writing the backing file
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored contents could not be encoded or decoded
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// True when the store itself is missing, as opposed to a failed operation
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;
