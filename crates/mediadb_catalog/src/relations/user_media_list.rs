//! Named per-user media lists.

use crate::impl_model;
use crate::media::{Media, MediaService};
use crate::user::{User, UserService};
use mediadb_core::{
    codec, EngineError, EngineResult, EntityId, Metadata, Model, PersistHooks, Repository,
    Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// A user-curated, named list of media records.
///
/// The member IDs are denormalized into the record; when a listed media
/// record is deleted, a cascade strips it from every list holding it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserMediaList {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The owning user.
    pub user_id: EntityId,
    /// List name, unique per user.
    pub name: String,
    /// Member media records, in list order.
    pub media_ids: Vec<EntityId>,
}

impl_model!(UserMediaList);

/// Service descriptor for [`UserMediaList`].
pub struct UserMediaListService {
    users: Repository<UserService>,
    media: Repository<MediaService>,
    hooks: PersistHooks<UserMediaList>,
}

impl UserMediaListService {
    /// Bucket holding user-media-list records.
    pub const BUCKET: &'static str = "user_media_lists";

    /// Creates the service. Deleting a user purges their lists;
    /// deleting a media record strips it from every list.
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
                    Repository::new(svc).strip_media(tx, media.meta().id)?;
                }
                Ok(())
            }));

        service
    }
}

impl Service for UserMediaListService {
    type Entity = UserMediaList;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn clean(&self, _tx: &Tx<'_>, entity: &mut UserMediaList) -> EngineResult<()> {
        entity.name = entity.name.trim().to_string();
        Ok(())
    }

    fn validate(&self, tx: &Tx<'_>, entity: &UserMediaList) -> EngineResult<()> {
        if entity.name.is_empty() {
            return Err(EngineError::nil("list name"));
        }
        self.users.ensure_exists(tx, entity.user_id)?;

        let mut seen = HashSet::new();
        for &media_id in &entity.media_ids {
            if !seen.insert(media_id) {
                return Err(EngineError::validation(format!(
                    "media {media_id} listed twice"
                )));
            }
            self.media.ensure_exists(tx, media_id)?;
        }

        // List names are unique per user, checked by linear scan.
        let bucket = tx.bucket(Self::BUCKET)?;
        for (_, bytes) in bucket.scan()? {
            let other: UserMediaList = codec::from_slice(&bytes)?;
            if other.user_id == entity.user_id
                && other.name == entity.name
                && other.meta.id != entity.meta.id
            {
                return Err(EngineError::already_exists(
                    Self::BUCKET,
                    format!("list {} for user {}", entity.name, entity.user_id),
                ));
            }
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<UserMediaList> {
        &self.hooks
    }
}

/// Query helpers on the user-media-list repository.
pub trait UserMediaListQueries {
    /// Returns one user's lists.
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserMediaList>>;

    /// Purges one user's lists.
    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize>;

    /// Removes a media record from every list holding it, updating the
    /// affected lists in place.
    fn strip_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize>;
}

impl UserMediaListQueries for Repository<UserMediaListService> {
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserMediaList>> {
        self.get_filter(tx, first, skip, |r| r.user_id == user_id)
    }

    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.user_id == user_id)
    }

    fn strip_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize> {
        let affected = self.get_filter(tx, None, None, |r| r.media_ids.contains(&media_id))?;
        let count = affected.len();
        for mut list in affected {
            list.media_ids.retain(|&id| id != media_id);
            self.update(tx, &mut list)?;
        }
        Ok(count)
    }
}
