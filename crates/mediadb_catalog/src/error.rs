//! Catalog error type.

use mediadb_core::EngineError;
use mediadb_storage::StoreError;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by the catalog facade.
///
/// Adapter layers map these onto their own response formats (HTTP
/// status codes, GraphQL error payloads); the catalog itself only
/// distinguishes engine failures from storage failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The persistence engine rejected or failed an operation.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The storage driver failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
