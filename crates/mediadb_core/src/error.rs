//! Error types for the persistence engine.

use crate::model::EntityId;
use mediadb_storage::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by the generic CRUD engine and entity services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No record with the requested ID exists in the bucket.
    #[error("no {bucket} record with id {id}")]
    NotFound {
        /// Bucket that was searched.
        bucket: String,
        /// The requested ID.
        id: u64,
    },

    /// A uniqueness constraint was violated.
    #[error("{bucket} record already exists: {detail}")]
    AlreadyExists {
        /// Bucket holding the conflicting record.
        bucket: String,
        /// What clashed.
        detail: String,
    },

    /// A value failed a structural check.
    #[error("invalid value: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },

    /// A required field or reference was absent.
    #[error("missing required value: {what}")]
    Nil {
        /// What was missing.
        what: String,
    },

    /// A mutating call received a read-only transaction.
    #[error("transaction is not writable")]
    UnwritableTransaction,

    /// A service's validation rejected the record.
    #[error("validation failed: {message}")]
    Validation {
        /// Why the record was rejected.
        message: String,
    },

    /// Serializing a record failed.
    #[error("marshal failed: {source}")]
    Marshal {
        /// The underlying codec error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Deserializing a record failed.
    #[error("unmarshal failed: {source}")]
    Unmarshal {
        /// The underlying codec error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The storage driver failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl EngineError {
    /// Creates a not-found error for a bucket and ID.
    pub fn not_found(bucket: impl Into<String>, id: EntityId) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            id: id.as_u64(),
        }
    }

    /// Creates an already-exists error.
    pub fn already_exists(bucket: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::AlreadyExists {
            bucket: bucket.into(),
            detail: detail.into(),
        }
    }

    /// Creates an invalid-value error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Creates a missing-value error.
    pub fn nil(what: impl Into<String>) -> Self {
        Self::Nil { what: what.into() }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Wraps a codec error from serialization.
    pub fn marshal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Marshal {
            source: Box::new(source),
        }
    }

    /// Wraps a codec error from deserialization.
    pub fn unmarshal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unmarshal {
            source: Box::new(source),
        }
    }
}
