//! Service contract: the per-entity descriptor driving the engine.

use crate::codec;
use crate::error::EngineResult;
use crate::hooks::PersistHooks;
use crate::model::Model;
use mediadb_storage::Tx;

/// Per-entity-type descriptor parameterizing the generic engine.
///
/// A service is a stateless object (apart from its hook registry) that
/// tells [`crate::Repository`] how to handle one [`Model`] type: which
/// bucket it lives in, how to normalize and validate it, how to default
/// it at creation, which fields are frozen across updates, and how it
/// is (de)serialized. Services are shared across transactions and must
/// be safe for concurrent use.
///
/// All methods except [`Service::bucket`], [`Service::validate`] and
/// [`Service::hooks`] have no-op or codec-backed defaults.
pub trait Service: Send + Sync + 'static {
    /// The entity type this service describes.
    type Entity: Model;

    /// Returns the name of the bucket holding this entity type.
    fn bucket(&self) -> &'static str;

    /// Normalizes fields in place before validation (e.g. trimming
    /// whitespace). Runs on both create and update.
    fn clean(&self, tx: &Tx<'_>, entity: &mut Self::Entity) -> EngineResult<()> {
        let _ = (tx, entity);
        Ok(())
    }

    /// Checks structural and referential validity.
    ///
    /// Relationship services re-fetch every referenced record here,
    /// inside the caller's transaction.
    fn validate(&self, tx: &Tx<'_>, entity: &Self::Entity) -> EngineResult<()>;

    /// Applies entity-specific defaults after the ID is assigned.
    /// Runs on create only.
    fn initialize(&self, tx: &Tx<'_>, entity: &mut Self::Entity) -> EngineResult<()> {
        let _ = (tx, entity);
        Ok(())
    }

    /// Carries entity-specific frozen fields forward from the stored
    /// record during an update.
    ///
    /// The engine has already restored the immutable metadata (ID,
    /// creation time) and recomputed the version as `old.version + 1`
    /// before calling this; services only need to copy their own
    /// caller-immutable fields (e.g. a stored credential) from `old`.
    fn persist_old_properties(
        &self,
        tx: &Tx<'_>,
        entity: &mut Self::Entity,
        old: &Self::Entity,
    ) -> EngineResult<()> {
        let _ = (tx, entity, old);
        Ok(())
    }

    /// Serializes the entity for storage.
    fn marshal(&self, entity: &Self::Entity) -> EngineResult<Vec<u8>> {
        codec::to_vec(entity)
    }

    /// Deserializes an entity from storage.
    fn unmarshal(&self, bytes: &[u8]) -> EngineResult<Self::Entity> {
        codec::from_slice(bytes)
    }

    /// Returns this service's lifecycle hook registry.
    fn hooks(&self) -> &PersistHooks<Self::Entity>;
}
