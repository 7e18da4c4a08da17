//! Entity fixtures and a populated catalog.

use mediadb_catalog::relations::{
    CharacterRole, MediaCharacter, MediaGenre, UserEpisode, UserMedia,
};
use mediadb_catalog::{
    Catalog, Character, Episode, EntityId, Genre, Media, Person, Producer, Title, User,
};

/// Opens a fresh in-memory catalog.
pub fn catalog() -> Catalog {
    Catalog::open_in_memory().expect("open in-memory catalog")
}

/// A minimal valid media record.
pub fn media(title: &str) -> Media {
    Media {
        titles: vec![Title::new("en", title)],
        synopsis: format!("Synopsis of {title}."),
        ..Default::default()
    }
}

/// A minimal valid character.
pub fn character(name: &str) -> Character {
    Character {
        name: name.to_string(),
        ..Default::default()
    }
}

/// A minimal valid genre.
pub fn genre(name: &str) -> Genre {
    Genre {
        name: name.to_string(),
        ..Default::default()
    }
}

/// A minimal valid person.
pub fn person(name: &str) -> Person {
    Person {
        name: name.to_string(),
        ..Default::default()
    }
}

/// A minimal valid producer.
pub fn producer(name: &str) -> Producer {
    Producer {
        name: name.to_string(),
        ..Default::default()
    }
}

/// A minimal valid episode of the given media record.
pub fn episode(media_id: EntityId, number: u32) -> Episode {
    Episode {
        media_id,
        number,
        ..Default::default()
    }
}

/// A minimal valid user. The hash stands in for whatever the external
/// authentication layer produces.
pub fn user(username: &str) -> User {
    User {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "pbkdf2$29000$c2FsdA$aGFzaA".to_string(),
        ..Default::default()
    }
}

/// IDs of a fully wired sample graph: one of everything, related.
#[derive(Debug, Clone, Copy)]
pub struct Universe {
    /// The media record.
    pub media: EntityId,
    /// Its character.
    pub character: EntityId,
    /// Its genre.
    pub genre: EntityId,
    /// The character's voice actor.
    pub person: EntityId,
    /// The producing studio.
    pub producer: EntityId,
    /// Episode 1 of the media.
    pub episode: EntityId,
    /// A user tracking all of it.
    pub user: EntityId,
    /// The media-character join record.
    pub media_character: EntityId,
    /// The media-genre join record.
    pub media_genre: EntityId,
    /// The user's tracking entry for the media.
    pub user_media: EntityId,
    /// The user's progress on episode 1.
    pub user_episode: EntityId,
}

impl Universe {
    /// Populates `catalog` with one of everything, wired together.
    pub fn populate(catalog: &Catalog) -> Self {
        catalog
            .update(|tx| {
                let media = catalog.media().create(tx, &mut media("Sample Show"))?;
                let character = catalog.characters().create(tx, &mut character("Lead"))?;
                let genre = catalog.genres().create(tx, &mut genre("drama"))?;
                let person = catalog.people().create(tx, &mut person("Voice Actor"))?;
                let producer = catalog.producers().create(tx, &mut producer("Studio"))?;
                let episode_id = catalog.episodes().create(tx, &mut episode(media, 1))?;
                let user_id = catalog.users().create(tx, &mut user("tracker"))?;

                let media_character = catalog.media_characters().create(
                    tx,
                    &mut MediaCharacter {
                        media_id: media,
                        character_id: Some(character),
                        character_role: Some(CharacterRole::Main),
                        person_id: Some(person),
                        ..Default::default()
                    },
                )?;
                let media_genre = catalog.media_genres().create(
                    tx,
                    &mut MediaGenre {
                        media_id: media,
                        genre_id: genre,
                        ..Default::default()
                    },
                )?;
                let user_media = catalog.user_media().create(
                    tx,
                    &mut UserMedia {
                        user_id,
                        media_id: media,
                        ..Default::default()
                    },
                )?;
                let user_episode = catalog.user_episodes().create(
                    tx,
                    &mut UserEpisode {
                        user_id,
                        episode_id,
                        watched: true,
                        ..Default::default()
                    },
                )?;

                Ok(Self {
                    media,
                    character,
                    genre,
                    person,
                    producer,
                    episode: episode_id,
                    user: user_id,
                    media_character,
                    media_genre,
                    user_media,
                    user_episode,
                })
            })
            .expect("populate universe")
    }
}
