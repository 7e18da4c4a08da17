//! Relationship services: join records between entity types.
//!
//! Every service here is constructed from [`mediadb_core::Repository`]
//! handles of the services it references and, at construction time,
//! appends cascading pre-delete hooks onto them. The hooks purge join
//! records whose foreign key matches the entity being deleted, inside
//! the same transaction — so construction must happen leaf-first, after
//! every referenced service exists and before any delete runs.
//! [`crate::Catalog`] enforces that order.
//!
//! `get_by_*` queries are plain equality-predicate scans of the whole
//! bucket; there are no secondary indexes, deliberately.

mod favorites;
mod media_character;
mod media_genre;
mod media_producer;
mod media_relation;
mod user_episode;
mod user_media;
mod user_media_list;

pub use favorites::{
    UserCharacter, UserCharacterQueries, UserCharacterService, UserPerson, UserPersonQueries,
    UserPersonService,
};
pub use media_character::{
    CharacterRole, MediaCharacter, MediaCharacterQueries, MediaCharacterService,
};
pub use media_genre::{MediaGenre, MediaGenreQueries, MediaGenreService};
pub use media_producer::{MediaProducer, MediaProducerQueries, MediaProducerService};
pub use media_relation::{MediaRelation, MediaRelationQueries, MediaRelationService, RelationKind};
pub use user_episode::{UserEpisode, UserEpisodeQueries, UserEpisodeService};
pub use user_media::{Priority, UserMedia, UserMediaQueries, UserMediaService, WatchStatus};
pub use user_media_list::{UserMediaList, UserMediaListQueries, UserMediaListService};
