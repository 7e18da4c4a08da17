//! Error types for store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another process holds the store file lock.
    #[error("store locked: {path:?} is held by another process")]
    Locked {
        /// Path of the locked store file.
        path: PathBuf,
    },

    /// The named bucket does not exist in this store.
    #[error("bucket not found: {name}")]
    BucketNotFound {
        /// Name of the missing bucket.
        name: String,
    },

    /// A mutating operation was attempted on a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,

    /// The journal contains an unreadable record.
    #[error("journal corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },
}

impl StoreError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}
