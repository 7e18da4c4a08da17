//! Producer entity and service.

use crate::impl_model;
use mediadb_core::{EngineError, EngineResult, Metadata, PersistHooks, Service, Tx};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A studio, publisher or licensor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Producer {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// Producer name.
    pub name: String,
    /// Short description.
    pub about: String,
}

impl_model!(Producer);

/// Service descriptor for [`Producer`].
pub struct ProducerService {
    hooks: PersistHooks<Producer>,
}

impl ProducerService {
    /// Bucket holding producer records.
    pub const BUCKET: &'static str = "producers";

    /// Creates the service.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            hooks: PersistHooks::new(),
        })
    }
}

impl Service for ProducerService {
    type Entity = Producer;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn clean(&self, _tx: &Tx<'_>, entity: &mut Producer) -> EngineResult<()> {
        entity.name = entity.name.trim().to_string();
        entity.about = entity.about.trim().to_string();
        Ok(())
    }

    fn validate(&self, _tx: &Tx<'_>, entity: &Producer) -> EngineResult<()> {
        if entity.name.is_empty() {
            return Err(EngineError::nil("producer name"));
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<Producer> {
        &self.hooks
    }
}
