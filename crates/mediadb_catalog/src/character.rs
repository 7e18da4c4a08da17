//! Character entity and service.

use crate::impl_model;
use mediadb_core::{EngineError, EngineResult, Metadata, PersistHooks, Service, Tx};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A fictional character appearing in catalogued media.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Character {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// Character name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl_model!(Character);

/// Service descriptor for [`Character`].
pub struct CharacterService {
    hooks: PersistHooks<Character>,
}

impl CharacterService {
    /// Bucket holding character records.
    pub const BUCKET: &'static str = "characters";

    /// Creates the service.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            hooks: PersistHooks::new(),
        })
    }
}

impl Service for CharacterService {
    type Entity = Character;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn clean(&self, _tx: &Tx<'_>, entity: &mut Character) -> EngineResult<()> {
        entity.name = entity.name.trim().to_string();
        entity.description = entity.description.trim().to_string();
        Ok(())
    }

    fn validate(&self, _tx: &Tx<'_>, entity: &Character) -> EngineResult<()> {
        if entity.name.is_empty() {
            return Err(EngineError::nil("character name"));
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<Character> {
        &self.hooks
    }
}
