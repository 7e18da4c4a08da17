//! Media–character appearances.

use crate::character::{Character, CharacterService};
use crate::impl_model;
use crate::media::{Media, MediaService};
use crate::person::{Person, PersonService};
use mediadb_core::{
    EngineError, EngineResult, EntityId, Metadata, Model, PersistHooks, Repository, Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How prominent a character is within a media record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterRole {
    /// Protagonist-level presence.
    Main,
    /// Recurring supporting character.
    Supporting,
    /// Background appearance.
    Background,
}

/// Joins a media record to a character appearance and/or the person
/// voicing or portraying it.
///
/// At least one of the character and person references must be set, and
/// the character role is paired with the character reference: set
/// exactly when the character is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaCharacter {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The media record.
    pub media_id: EntityId,
    /// The appearing character, if any.
    pub character_id: Option<EntityId>,
    /// Prominence of the appearance; paired with `character_id`.
    pub character_role: Option<CharacterRole>,
    /// The voice actor / portraying person, if any.
    pub person_id: Option<EntityId>,
}

impl_model!(MediaCharacter);

/// Service descriptor for [`MediaCharacter`].
pub struct MediaCharacterService {
    media: Repository<MediaService>,
    characters: Repository<CharacterService>,
    people: Repository<PersonService>,
    hooks: PersistHooks<MediaCharacter>,
}

impl MediaCharacterService {
    /// Bucket holding media-character records.
    pub const BUCKET: &'static str = "media_characters";

    /// Creates the service and registers cascades on every referenced
    /// service.
    pub fn new(
        media: Repository<MediaService>,
        characters: Repository<CharacterService>,
        people: Repository<PersonService>,
    ) -> Arc<Self> {
        let service = Arc::new(Self {
            media: media.clone(),
            characters: characters.clone(),
            people: people.clone(),
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
        characters
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, character: &Character| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_character(tx, character.meta().id)?;
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

impl Service for MediaCharacterService {
    type Entity = MediaCharacter;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn validate(&self, tx: &Tx<'_>, entity: &MediaCharacter) -> EngineResult<()> {
        self.media.ensure_exists(tx, entity.media_id)?;

        if entity.character_id.is_none() && entity.person_id.is_none() {
            return Err(EngineError::nil("character or person reference"));
        }
        if entity.character_id.is_some() != entity.character_role.is_some() {
            return Err(EngineError::validation(
                "character role must be set exactly when a character is referenced",
            ));
        }

        if let Some(character_id) = entity.character_id {
            self.characters.ensure_exists(tx, character_id)?;
        }
        if let Some(person_id) = entity.person_id {
            self.people.ensure_exists(tx, person_id)?;
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<MediaCharacter> {
        &self.hooks
    }
}

/// Query helpers on the media-character repository.
pub trait MediaCharacterQueries {
    /// Returns appearances within one media record.
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaCharacter>>;

    /// Returns appearances of one character.
    fn get_by_character(
        &self,
        tx: &Tx<'_>,
        character_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaCharacter>>;

    /// Returns appearances credited to one person.
    fn get_by_person(
        &self,
        tx: &Tx<'_>,
        person_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaCharacter>>;

    /// Purges all appearances within one media record.
    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize>;

    /// Purges all appearances of one character.
    fn delete_by_character(&self, tx: &Tx<'_>, character_id: EntityId) -> EngineResult<usize>;

    /// Purges all appearances credited to one person.
    fn delete_by_person(&self, tx: &Tx<'_>, person_id: EntityId) -> EngineResult<usize>;
}

impl MediaCharacterQueries for Repository<MediaCharacterService> {
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaCharacter>> {
        self.get_filter(tx, first, skip, |r| r.media_id == media_id)
    }

    fn get_by_character(
        &self,
        tx: &Tx<'_>,
        character_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaCharacter>> {
        self.get_filter(tx, first, skip, |r| r.character_id == Some(character_id))
    }

    fn get_by_person(
        &self,
        tx: &Tx<'_>,
        person_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaCharacter>> {
        self.get_filter(tx, first, skip, |r| r.person_id == Some(person_id))
    }

    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.media_id == media_id)
    }

    fn delete_by_character(&self, tx: &Tx<'_>, character_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.character_id == Some(character_id))
    }

    fn delete_by_person(&self, tx: &Tx<'_>, person_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.person_id == Some(person_id))
    }
}
