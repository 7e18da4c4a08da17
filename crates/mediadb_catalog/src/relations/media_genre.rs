//! Media–genre tagging.

use crate::genre::{Genre, GenreService};
use crate::impl_model;
use crate::media::{Media, MediaService};
use mediadb_core::{
    EngineResult, EntityId, Metadata, Model, PersistHooks, Repository, Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Joins a media record to a genre.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaGenre {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The tagged media record.
    pub media_id: EntityId,
    /// The genre.
    pub genre_id: EntityId,
}

impl_model!(MediaGenre);

/// Service descriptor for [`MediaGenre`].
pub struct MediaGenreService {
    media: Repository<MediaService>,
    genres: Repository<GenreService>,
    hooks: PersistHooks<MediaGenre>,
}

impl MediaGenreService {
    /// Bucket holding media-genre records.
    pub const BUCKET: &'static str = "media_genres";

    /// Creates the service and registers cascades on both sides.
    pub fn new(media: Repository<MediaService>, genres: Repository<GenreService>) -> Arc<Self> {
        let service = Arc::new(Self {
            media: media.clone(),
            genres: genres.clone(),
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

        let weak = Arc::downgrade(&service);
        genres
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, genre: &Genre| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_genre(tx, genre.meta().id)?;
                }
                Ok(())
            }));

        service
    }
}

impl Service for MediaGenreService {
    type Entity = MediaGenre;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn validate(&self, tx: &Tx<'_>, entity: &MediaGenre) -> EngineResult<()> {
        self.media.ensure_exists(tx, entity.media_id)?;
        self.genres.ensure_exists(tx, entity.genre_id)?;
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<MediaGenre> {
        &self.hooks
    }
}

/// Query helpers on the media-genre repository.
pub trait MediaGenreQueries {
    /// Returns the genre tags of one media record.
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaGenre>>;

    /// Returns the media records tagged with one genre.
    fn get_by_genre(
        &self,
        tx: &Tx<'_>,
        genre_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaGenre>>;

    /// Purges the tags of one media record.
    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize>;

    /// Purges all tags referencing one genre.
    fn delete_by_genre(&self, tx: &Tx<'_>, genre_id: EntityId) -> EngineResult<usize>;
}

impl MediaGenreQueries for Repository<MediaGenreService> {
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaGenre>> {
        self.get_filter(tx, first, skip, |r| r.media_id == media_id)
    }

    fn get_by_genre(
        &self,
        tx: &Tx<'_>,
        genre_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaGenre>> {
        self.get_filter(tx, first, skip, |r| r.genre_id == genre_id)
    }

    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.media_id == media_id)
    }

    fn delete_by_genre(&self, tx: &Tx<'_>, genre_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.genre_id == genre_id)
    }
}
