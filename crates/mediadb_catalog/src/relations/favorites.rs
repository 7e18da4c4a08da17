//! User favorites: characters and people.

use crate::character::{Character, CharacterService};
use crate::impl_model;
use crate::person::{Person, PersonService};
use crate::user::{User, UserService};
use mediadb_core::{
    EngineResult, EntityId, Metadata, Model, PersistHooks, Repository, Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Marks a character as a user's favorite.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserCharacter {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The user.
    pub user_id: EntityId,
    /// The favorited character.
    pub character_id: EntityId,
}

impl_model!(UserCharacter);

/// Service descriptor for [`UserCharacter`].
pub struct UserCharacterService {
    users: Repository<UserService>,
    characters: Repository<CharacterService>,
    hooks: PersistHooks<UserCharacter>,
}

impl UserCharacterService {
    /// Bucket holding user-character records.
    pub const BUCKET: &'static str = "user_characters";

    /// Creates the service and registers cascades on both sides.
    pub fn new(
        users: Repository<UserService>,
        characters: Repository<CharacterService>,
    ) -> Arc<Self> {
        let service = Arc::new(Self {
            users: users.clone(),
            characters: characters.clone(),
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
        characters
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, character: &Character| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_character(tx, character.meta().id)?;
                }
                Ok(())
            }));

        service
    }
}

impl Service for UserCharacterService {
    type Entity = UserCharacter;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn validate(&self, tx: &Tx<'_>, entity: &UserCharacter) -> EngineResult<()> {
        self.users.ensure_exists(tx, entity.user_id)?;
        self.characters.ensure_exists(tx, entity.character_id)?;
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<UserCharacter> {
        &self.hooks
    }
}

/// Query helpers on the user-character repository.
pub trait UserCharacterQueries {
    /// Returns one user's favorite characters.
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserCharacter>>;

    /// Purges one user's character favorites.
    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize>;

    /// Purges all favorites of one character.
    fn delete_by_character(&self, tx: &Tx<'_>, character_id: EntityId) -> EngineResult<usize>;
}

impl UserCharacterQueries for Repository<UserCharacterService> {
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserCharacter>> {
        self.get_filter(tx, first, skip, |r| r.user_id == user_id)
    }

    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.user_id == user_id)
    }

    fn delete_by_character(&self, tx: &Tx<'_>, character_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.character_id == character_id)
    }
}

/// Marks a person as a user's favorite.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPerson {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The user.
    pub user_id: EntityId,
    /// The favorited person.
    pub person_id: EntityId,
}

impl_model!(UserPerson);

/// Service descriptor for [`UserPerson`].
pub struct UserPersonService {
    users: Repository<UserService>,
    people: Repository<PersonService>,
    hooks: PersistHooks<UserPerson>,
}

impl UserPersonService {
    /// Bucket holding user-person records.
    pub const BUCKET: &'static str = "user_people";

    /// Creates the service and registers cascades on both sides.
    pub fn new(users: Repository<UserService>, people: Repository<PersonService>) -> Arc<Self> {
        let service = Arc::new(Self {
            users: users.clone(),
            people: people.clone(),
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
        people
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, person: &Person| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_person(tx, person.meta().id)?;
                }
                Ok(())
            }));

        service
    }
}

impl Service for UserPersonService {
    type Entity = UserPerson;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn validate(&self, tx: &Tx<'_>, entity: &UserPerson) -> EngineResult<()> {
        self.users.ensure_exists(tx, entity.user_id)?;
        self.people.ensure_exists(tx, entity.person_id)?;
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<UserPerson> {
        &self.hooks
    }
}

/// Query helpers on the user-person repository.
pub trait UserPersonQueries {
    /// Returns one user's favorite people.
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserPerson>>;

    /// Purges one user's person favorites.
    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize>;

    /// Purges all favorites of one person.
    fn delete_by_person(&self, tx: &Tx<'_>, person_id: EntityId) -> EngineResult<usize>;
}

impl UserPersonQueries for Repository<UserPersonService> {
    fn get_by_user(
        &self,
        tx: &Tx<'_>,
        user_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<UserPerson>> {
        self.get_filter(tx, first, skip, |r| r.user_id == user_id)
    }

    fn delete_by_user(&self, tx: &Tx<'_>, user_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.user_id == user_id)
    }

    fn delete_by_person(&self, tx: &Tx<'_>, person_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.person_id == person_id)
    }
}
