//! Episode entity and service.
//!
//! Episodes belong to a media record. Deleting a media record purges
//! its episodes, which in turn purges per-user episode progress through
//! the episode service's own delete hooks.

use crate::impl_model;
use crate::media::{Media, MediaService};
use mediadb_core::{
    EngineError, EngineResult, EntityId, Metadata, Model, PersistHooks, Repository, Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single episode of a media record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Episode {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The media record this episode belongs to.
    pub media_id: EntityId,
    /// Episode number within the media, starting at 1.
    pub number: u32,
    /// Episode title, when known.
    pub title: Option<String>,
    /// Episode synopsis.
    pub synopsis: String,
}

impl_model!(Episode);

/// Service descriptor for [`Episode`].
pub struct EpisodeService {
    media: Repository<MediaService>,
    hooks: PersistHooks<Episode>,
}

impl EpisodeService {
    /// Bucket holding episode records.
    pub const BUCKET: &'static str = "episodes";

    /// Creates the service and registers the media cascade.
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

impl Service for EpisodeService {
    type Entity = Episode;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn clean(&self, _tx: &Tx<'_>, entity: &mut Episode) -> EngineResult<()> {
        if let Some(title) = &mut entity.title {
            *title = title.trim().to_string();
            if title.is_empty() {
                entity.title = None;
            }
        }
        entity.synopsis = entity.synopsis.trim().to_string();
        Ok(())
    }

    fn validate(&self, tx: &Tx<'_>, entity: &Episode) -> EngineResult<()> {
        self.media.ensure_exists(tx, entity.media_id)?;
        if entity.number == 0 {
            return Err(EngineError::invalid("episode number must start at 1"));
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<Episode> {
        &self.hooks
    }
}

/// Query helpers on the episode repository.
pub trait EpisodeQueries {
    /// Returns the episodes of one media record, ID-ordered and
    /// windowed by `first`/`skip`.
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<Episode>>;

    /// Deletes every episode of one media record.
    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize>;
}

impl EpisodeQueries for Repository<EpisodeService> {
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<Episode>> {
        self.get_filter(tx, first, skip, |e| e.media_id == media_id)
    }

    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |e| e.media_id == media_id)
    }
}
