//! Per-user episode progress.

use crate::episode::{Episode, EpisodeService};
use crate::impl_model;
use crate::user::{User, UserService};
use mediadb_core::{
    codec, EngineError, EngineResult, EntityId, Metadata, Model, PersistHooks, Repository,
    Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One user's progress on one episode.
///
/// A user has at most one progress record per episode. Because episode
/// deletion cascades from media deletion, deleting a media record
/// transitively purges these as well.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserEpisode {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The user.
    pub user_id: EntityId,
    /// The episode.
    pub episode_id: EntityId,
    /// Whether the user has watched the episode.
    pub watched: bool,
}

impl_model!(UserEpisode);

/// Service descriptor for [`UserEpisode`].
pub struct UserEpisodeService {
    users: Repository<UserService>,
    episodes: Repository<EpisodeService>,
    hooks: PersistHooks<UserEpisode>,
}

impl UserEpisodeService {
    /// Bucket holding user-episode records.
    pub const BUCKET: &'static str = "user_episodes";

    /// Creates the service and registers cascades on both sides.
    pub fn new(users: Repository<UserService>, episodes: Repository<EpisodeService>) -> Arc<Self> {
        let service = Arc::new(Self {
            users: users.clone(),
            episodes: episodes.clone(),
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
        episodes
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, episode: &Episode| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_episode(tx, episode.meta().id)?;
                }
                Ok(())
            }));

        service
    }
}

impl Service for UserEpisodeService {
    type Entity = UserEpisode;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn validate(&self, tx: &Tx<'_>, entity: &UserEpisode) -> EngineResult<()> {
        self.users.ensure_exists(tx, entity.user_id)?;
        self.episodes.ensure_exists(tx, entity.episode_id)?;

        let bucket = tx.bucket(Self::BUCKET)?;
        for (_, bytes) in bucket.scan()? {
            let other: UserEpisode = codec::from_slice(&bytes)?;
            if other.user_id == entity.user_id
                && other.episode_id == entity.episode_id
                && other.meta.id != entity.meta.id
            {
                return Err(EngineError::already_exists(
                    Self::BUCKET,
                    format!(
                        "user {} already tracks episode {}",
                        entity.user_id, entity.episode_id
                    ),
                ));
            }
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<UserEpisode> {
        &self.hooks
    }
}

/// Query helpers on the user-episode repository.
pub trait UserEpisodeQueries {
    /// Returns one user's episode progress records.
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserEpisode>>;

    /// Purges one user's episode progress records.
    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize>;

    /// Purges all progress records of one episode.
    fn delete_by_episode(&self, tx: &Tx<'_>, episode_id: EntityId) -> EngineResult<usize>;
}

impl UserEpisodeQueries for Repository<UserEpisodeService> {
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserEpisode>> {
        self.get_filter(tx, first, skip, |r| r.user_id == user_id)
    }

    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.user_id == user_id)
    }

    fn delete_by_episode(&self, tx: &Tx<'_>, episode_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.episode_id == episode_id)
    }
}
