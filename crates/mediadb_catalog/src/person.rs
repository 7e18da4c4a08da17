//! Person entity and service.

use crate::impl_model;
use mediadb_core::{EngineError, EngineResult, Metadata, PersistHooks, Service, Tx};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A real person: voice actor, director, author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Person {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// Person name.
    pub name: String,
    /// Short biography.
    pub about: String,
}

impl_model!(Person);

/// Service descriptor for [`Person`].
pub struct PersonService {
    hooks: PersistHooks<Person>,
}

impl PersonService {
    /// Bucket holding person records.
    pub const BUCKET: &'static str = "people";

    /// Creates the service.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            hooks: PersistHooks::new(),
        })
    }
}

impl Service for PersonService {
    type Entity = Person;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn clean(&self, _tx: &Tx<'_>, entity: &mut Person) -> EngineResult<()> {
        entity.name = entity.name.trim().to_string();
        entity.about = entity.about.trim().to_string();
        Ok(())
    }

    fn validate(&self, _tx: &Tx<'_>, entity: &Person) -> EngineResult<()> {
        if entity.name.is_empty() {
            return Err(EngineError::nil("person name"));
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<Person> {
        &self.hooks
    }
}
