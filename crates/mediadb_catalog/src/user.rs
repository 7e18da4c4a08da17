//! User entity and service.

use crate::impl_model;
use mediadb_core::{codec, EngineError, EngineResult, Metadata, PersistHooks, Service, Tx};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Permission flags of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    /// Full administrative access.
    pub admin: bool,
    /// Moderation access to catalog contents.
    pub moderator: bool,
}

/// A registered user account.
///
/// The password hash is produced by the (external) authentication
/// layer; this service only stores it and keeps it frozen across
/// updates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// Unique login name, stored lowercase.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Credential hash from the authentication layer.
    pub password_hash: String,
    /// Permission flags; reset to defaults at creation.
    pub permissions: Permissions,
}

impl_model!(User);

/// Service descriptor for [`User`].
pub struct UserService {
    hooks: PersistHooks<User>,
}

impl UserService {
    /// Bucket holding user records.
    pub const BUCKET: &'static str = "users";

    /// Creates the service.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            hooks: PersistHooks::new(),
        })
    }
}

impl Service for UserService {
    type Entity = User;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn clean(&self, _tx: &Tx<'_>, entity: &mut User) -> EngineResult<()> {
        entity.username = entity.username.trim().to_lowercase();
        entity.email = entity.email.trim().to_string();
        Ok(())
    }

    fn validate(&self, tx: &Tx<'_>, entity: &User) -> EngineResult<()> {
        if entity.username.is_empty() {
            return Err(EngineError::nil("username"));
        }
        if !entity.email.contains('@') {
            return Err(EngineError::invalid(format!(
                "malformed email address: {}",
                entity.email
            )));
        }

        // Uniqueness by linear scan; the bucket has no secondary index.
        let bucket = tx.bucket(Self::BUCKET)?;
        for (_, bytes) in bucket.scan()? {
            let other: User = codec::from_slice(&bytes)?;
            if other.username == entity.username && other.meta.id != entity.meta.id {
                return Err(EngineError::already_exists(
                    Self::BUCKET,
                    format!("username {}", entity.username),
                ));
            }
        }
        Ok(())
    }

    fn initialize(&self, _tx: &Tx<'_>, entity: &mut User) -> EngineResult<()> {
        // Runs on create only: a fresh account needs a credential and
        // starts with default permissions no matter what was supplied.
        if entity.password_hash.is_empty() {
            return Err(EngineError::nil("password hash"));
        }
        entity.permissions = Permissions::default();
        Ok(())
    }

    fn persist_old_properties(
        &self,
        _tx: &Tx<'_>,
        entity: &mut User,
        old: &User,
    ) -> EngineResult<()> {
        // The credential cannot be changed through a regular update,
        // whatever the caller supplied.
        entity.password_hash = old.password_hash.clone();
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<User> {
        &self.hooks
    }
}
