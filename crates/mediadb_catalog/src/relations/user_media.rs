//! Per-user media list entries (watch status, score, priority).

use crate::impl_model;
use crate::media::{Media, MediaService};
use crate::user::{User, UserService};
use mediadb_core::{
    codec, EngineError, EngineResult, EntityId, Metadata, Model, PersistHooks, Repository,
    Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where a media record sits in a user's watch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WatchStatus {
    /// On the to-watch list.
    #[default]
    Planning,
    /// Currently being watched.
    Watching,
    /// Watched to the end.
    Completed,
    /// On hold.
    Paused,
    /// Abandoned.
    Dropped,
}

/// How eager the user is to get to this entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    /// Someday.
    Low,
    /// Soon.
    Medium,
    /// Next.
    High,
}

/// One user's tracking entry for one media record.
///
/// A user tracks a given media record at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserMedia {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The tracking user.
    pub user_id: EntityId,
    /// The tracked media record.
    pub media_id: EntityId,
    /// Watch status.
    pub status: WatchStatus,
    /// Score from 0 to 100, when rated.
    pub score: Option<u8>,
    /// Watch priority, when set.
    pub priority: Option<Priority>,
}

impl_model!(UserMedia);

/// Service descriptor for [`UserMedia`].
pub struct UserMediaService {
    users: Repository<UserService>,
    media: Repository<MediaService>,
    hooks: PersistHooks<UserMedia>,
}

impl UserMediaService {
    /// Bucket holding user-media records.
    pub const BUCKET: &'static str = "user_media";

    /// Creates the service and registers cascades on both sides.
    pub fn new(users: Repository<UserService>, media: Repository<MediaService>) -> Arc<Self> {
        let service = Arc::new(Self {
            users: users.clone(),
            media: media.clone(),
            hooks: PersistHooks::new(),
        });

        let weak = Arc::downgrade(&service);
        users
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, user: &User| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_user(tx, user.meta().id)?;
                }
                Ok(())
            }));

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

impl Service for UserMediaService {
    type Entity = UserMedia;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn validate(&self, tx: &Tx<'_>, entity: &UserMedia) -> EngineResult<()> {
        self.users.ensure_exists(tx, entity.user_id)?;
        self.media.ensure_exists(tx, entity.media_id)?;

        if let Some(score) = entity.score {
            if score > 100 {
                return Err(EngineError::invalid(format!(
                    "score {score} out of range 0..=100"
                )));
            }
        }

        // One entry per (user, media) pair, checked by linear scan.
        let bucket = tx.bucket(Self::BUCKET)?;
        for (_, bytes) in bucket.scan()? {
            let other: UserMedia = codec::from_slice(&bytes)?;
            if other.user_id == entity.user_id
                && other.media_id == entity.media_id
                && other.meta.id != entity.meta.id
            {
                return Err(EngineError::already_exists(
                    Self::BUCKET,
                    format!(
                        "user {} already tracks media {}",
                        entity.user_id, entity.media_id
                    ),
                ));
            }
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<UserMedia> {
        &self.hooks
    }
}

/// Query helpers on the user-media repository.
pub trait UserMediaQueries {
    /// Returns one user's tracking entries.
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserMedia>>;

    /// Returns all tracking entries of one media record.
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserMedia>>;

    /// Purges one user's tracking entries.
    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize>;

    /// Purges all tracking entries of one media record.
    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize>;
}

impl UserMediaQueries for Repository<UserMediaService> {
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserMedia>> {
        self.get_filter(tx, first, skip, |r| r.user_id == user_id)
    }

    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserMedia>> {
        self.get_filter(tx, first, skip, |r| r.media_id == media_id)
    }

    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.user_id == user_id)
    }

    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.media_id == media_id)
    }
}
