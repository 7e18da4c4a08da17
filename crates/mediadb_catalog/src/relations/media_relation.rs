//! Media–media relations (sequels, adaptations, ...).

use crate::impl_model;
use crate::media::{Media, MediaService};
use mediadb_core::{
    EngineError, EngineResult, EntityId, Metadata, Model, PersistHooks, Repository, Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How two media records relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// Continues after the related media.
    Sequel,
    /// Takes place before the related media.
    Prequel,
    /// Shares the setting without continuing the story.
    SideStory,
    /// Spins off a character or element.
    Spinoff,
    /// Retells the related media in another medium.
    Adaptation,
    /// Alternative telling of the same story.
    Alternative,
}

/// Joins one media record to another.
///
/// The relation is directional: `media_id` relates to `related_id` as
/// described by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRelation {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The relating media record.
    pub media_id: EntityId,
    /// The related media record.
    pub related_id: EntityId,
    /// Kind of relation.
    pub kind: RelationKind,
}

impl_model!(MediaRelation);

/// Service descriptor for [`MediaRelation`].
pub struct MediaRelationService {
    media: Repository<MediaService>,
    hooks: PersistHooks<MediaRelation>,
}

impl MediaRelationService {
    /// Bucket holding media-relation records.
    pub const BUCKET: &'static str = "media_relations";

    /// Creates the service; deleting a media record purges relations
    /// on either side of it.
    pub fn new(media: Repository<MediaService>) -> Arc<Self> {
        let service = Arc::new(Self {
            media: media.clone(),
            hooks: PersistHooks::new(),
        });

        let weak = Arc::downgrade(&service);
        media
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, media: &Media| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_media(tx, media.meta().id)?;
                }
                Ok(())
            }));

        service
    }
}

impl Service for MediaRelationService {
    type Entity = MediaRelation;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn validate(&self, tx: &Tx<'_>, entity: &MediaRelation) -> EngineResult<()> {
        if entity.media_id == entity.related_id {
            return Err(EngineError::validation(
                "a media record cannot relate to itself",
            ));
        }
        self.media.ensure_exists(tx, entity.media_id)?;
        self.media.ensure_exists(tx, entity.related_id)?;
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<MediaRelation> {
        &self.hooks
    }
}

/// Query helpers on the media-relation repository.
pub trait MediaRelationQueries {
    /// Returns relations touching one media record on either side.
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaRelation>>;

    /// Purges relations touching one media record on either side.
    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize>;
}

impl MediaRelationQueries for Repository<MediaRelationService> {
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaRelation>> {
        self.get_filter(tx, first, skip, |r| {
            r.media_id == media_id || r.related_id == media_id
        })
    }

    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.media_id == media_id || r.related_id == media_id)
    }
}
