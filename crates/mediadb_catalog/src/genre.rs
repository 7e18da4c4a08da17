//! Genre entity and service.

use crate::impl_model;
use mediadb_core::{EngineError, EngineResult, Metadata, PersistHooks, Service, Tx};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A genre tag, e.g. "mecha" or "slice of life".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Genre {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// Genre name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl_model!(Genre);

/// Service descriptor for [`Genre`].
pub struct GenreService {
    hooks: PersistHooks<Genre>,
}

impl GenreService {
    /// Bucket holding genre records.
    pub const BUCKET: &'static str = "genres";

    /// Creates the service.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            hooks: PersistHooks::new(),
        })
    }
}

impl Service for GenreService {
    type Entity = Genre;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn clean(&self, _tx: &Tx<'_>, entity: &mut Genre) -> EngineResult<()> {
        entity.name = entity.name.trim().to_string();
        entity.description = entity.description.trim().to_string();
        Ok(())
    }

    fn validate(&self, _tx: &Tx<'_>, entity: &Genre) -> EngineResult<()> {
        if entity.name.is_empty() {
            return Err(EngineError::nil("genre name"));
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<Genre> {
        &self.hooks
    }
}
