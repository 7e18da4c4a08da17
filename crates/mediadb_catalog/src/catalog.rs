//! Catalog facade: store ownership and service wiring.

use crate::character::CharacterService;
use crate::episode::EpisodeService;
use crate::error::{CatalogError, CatalogResult};
use crate::genre::GenreService;
use crate::media::MediaService;
use crate::person::PersonService;
use crate::producer::ProducerService;
use crate::relations::{
    MediaCharacterService, MediaGenreService, MediaProducerService, MediaRelationService,
    UserCharacterService, UserEpisodeService, UserMediaListService, UserMediaService,
    UserPersonService,
};
use crate::secret::TokenSecrets;
use crate::user::UserService;
use mediadb_core::Repository;
use mediadb_storage::{Store, StoreOptions, Tx};
use std::path::Path;
use tracing::info;

/// Options for opening a [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// POSIX mode applied to a newly created store file (Unix only).
    pub file_mode: Option<u32>,
    /// Whether to fsync the journal on every commit. Defaults to `true`.
    pub sync_on_commit: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            file_mode: None,
            sync_on_commit: true,
        }
    }
}

impl CatalogOptions {
    /// Creates options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the POSIX file mode for the store file.
    #[must_use]
    pub const fn file_mode(mut self, mode: u32) -> Self {
        self.file_mode = Some(mode);
        self
    }

    /// Sets whether to fsync the journal on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}

/// The wired-up media catalog.
///
/// Owns the store and one repository per entity type, constructed
/// leaf-first so every relationship service can register its cascades
/// on the services it references. Adapter layers open one transaction
/// per request through [`Catalog::view`] / [`Catalog::update`] and call
/// repository methods inside it.
pub struct Catalog {
    store: Store,
    secrets: TokenSecrets,

    media: Repository<MediaService>,
    characters: Repository<CharacterService>,
    genres: Repository<GenreService>,
    people: Repository<PersonService>,
    producers: Repository<ProducerService>,
    episodes: Repository<EpisodeService>,
    users: Repository<UserService>,

    media_characters: Repository<MediaCharacterService>,
    media_genres: Repository<MediaGenreService>,
    media_producers: Repository<MediaProducerService>,
    media_relations: Repository<MediaRelationService>,
    user_media: Repository<UserMediaService>,
    user_media_lists: Repository<UserMediaListService>,
    user_characters: Repository<UserCharacterService>,
    user_people: Repository<UserPersonService>,
    user_episodes: Repository<UserEpisodeService>,
}

impl Catalog {
    /// Every bucket the catalog uses, passed to the store at open.
    pub const BUCKETS: [&'static str; 17] = [
        MediaService::BUCKET,
        CharacterService::BUCKET,
        GenreService::BUCKET,
        PersonService::BUCKET,
        ProducerService::BUCKET,
        EpisodeService::BUCKET,
        UserService::BUCKET,
        MediaCharacterService::BUCKET,
        MediaGenreService::BUCKET,
        MediaProducerService::BUCKET,
        MediaRelationService::BUCKET,
        UserMediaService::BUCKET,
        UserMediaListService::BUCKET,
        UserCharacterService::BUCKET,
        UserPersonService::BUCKET,
        UserEpisodeService::BUCKET,
        TokenSecrets::BUCKET,
    ];

    /// Opens or creates the catalog database at `path`.
    pub fn open(path: &Path, options: CatalogOptions) -> CatalogResult<Self> {
        let mut store_options = StoreOptions::new()
            .buckets(Self::BUCKETS)
            .sync_on_commit(options.sync_on_commit);
        if let Some(mode) = options.file_mode {
            store_options = store_options.file_mode(mode);
        }

        let store = Store::open(path, store_options)?;
        info!(path = %path.display(), "catalog opened");
        Ok(Self::wire(store))
    }

    /// Opens a fresh in-memory catalog for tests.
    pub fn open_in_memory() -> CatalogResult<Self> {
        let store = Store::open_in_memory(StoreOptions::new().buckets(Self::BUCKETS))?;
        Ok(Self::wire(store))
    }

    /// Constructs and cross-wires all services.
    ///
    /// Order matters: plain entity services first, then relationship
    /// services, each of which appends cascade hooks to the services
    /// it references at construction.
    fn wire(store: Store) -> Self {
        let media = Repository::new(MediaService::new());
        let characters = Repository::new(CharacterService::new());
        let genres = Repository::new(GenreService::new());
        let people = Repository::new(PersonService::new());
        let producers = Repository::new(ProducerService::new());
        let users = Repository::new(UserService::new());

        let episodes = Repository::new(EpisodeService::new(media.clone()));

        let media_characters = Repository::new(MediaCharacterService::new(
            media.clone(),
            characters.clone(),
            people.clone(),
        ));
        let media_genres = Repository::new(MediaGenreService::new(media.clone(), genres.clone()));
        let media_producers =
            Repository::new(MediaProducerService::new(media.clone(), producers.clone()));
        let media_relations = Repository::new(MediaRelationService::new(media.clone()));

        let user_media = Repository::new(UserMediaService::new(users.clone(), media.clone()));
        let user_media_lists =
            Repository::new(UserMediaListService::new(users.clone(), media.clone()));
        let user_characters =
            Repository::new(UserCharacterService::new(users.clone(), characters.clone()));
        let user_people = Repository::new(UserPersonService::new(users.clone(), people.clone()));
        let user_episodes =
            Repository::new(UserEpisodeService::new(users.clone(), episodes.clone()));

        let secrets = TokenSecrets::new(store.clone());

        Self {
            store,
            secrets,
            media,
            characters,
            genres,
            people,
            producers,
            episodes,
            users,
            media_characters,
            media_genres,
            media_producers,
            media_relations,
            user_media,
            user_media_lists,
            user_characters,
            user_people,
            user_episodes,
        }
    }

    /// Runs `f` in a read-only transaction.
    pub fn view<T>(&self, f: impl FnOnce(&Tx<'_>) -> CatalogResult<T>) -> CatalogResult<T> {
        self.store.view(f)
    }

    /// Runs `f` in a writable transaction, committing on `Ok` and
    /// rolling back whole on `Err`.
    pub fn update<T>(&self, f: impl FnOnce(&Tx<'_>) -> CatalogResult<T>) -> CatalogResult<T> {
        self.store.update(f)
    }

    /// Wipes all catalog data. Test teardown only.
    pub fn clear(&self) -> CatalogResult<()> {
        self.store.clear().map_err(CatalogError::from)
    }

    /// Returns the token-signing secret, generating it on first use.
    pub fn signing_secret(&self) -> CatalogResult<[u8; crate::secret::SECRET_LEN]> {
        self.secrets.signing_secret()
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Media repository.
    #[must_use]
    pub fn media(&self) -> &Repository<MediaService> {
        &self.media
    }

    /// Character repository.
    #[must_use]
    pub fn characters(&self) -> &Repository<CharacterService> {
        &self.characters
    }

    /// Genre repository.
    #[must_use]
    pub fn genres(&self) -> &Repository<GenreService> {
        &self.genres
    }

    /// Person repository.
    #[must_use]
    pub fn people(&self) -> &Repository<PersonService> {
        &self.people
    }

    /// Producer repository.
    #[must_use]
    pub fn producers(&self) -> &Repository<ProducerService> {
        &self.producers
    }

    /// Episode repository.
    #[must_use]
    pub fn episodes(&self) -> &Repository<EpisodeService> {
        &self.episodes
    }

    /// User repository.
    #[must_use]
    pub fn users(&self) -> &Repository<UserService> {
        &self.users
    }

    /// Media-character repository.
    #[must_use]
    pub fn media_characters(&self) -> &Repository<MediaCharacterService> {
        &self.media_characters
    }

    /// Media-genre repository.
    #[must_use]
    pub fn media_genres(&self) -> &Repository<MediaGenreService> {
        &self.media_genres
    }

    /// Media-producer repository.
    #[must_use]
    pub fn media_producers(&self) -> &Repository<MediaProducerService> {
        &self.media_producers
    }

    /// Media-relation repository.
    #[must_use]
    pub fn media_relations(&self) -> &Repository<MediaRelationService> {
        &self.media_relations
    }

    /// User-media repository.
    #[must_use]
    pub fn user_media(&self) -> &Repository<UserMediaService> {
        &self.user_media
    }

    /// User-media-list repository.
    #[must_use]
    pub fn user_media_lists(&self) -> &Repository<UserMediaListService> {
        &self.user_media_lists
    }

    /// User-character repository.
    #[must_use]
    pub fn user_characters(&self) -> &Repository<UserCharacterService> {
        &self.user_characters
    }

    /// User-person repository.
    #[must_use]
    pub fn user_people(&self) -> &Repository<UserPersonService> {
        &self.user_people
    }

    /// User-episode repository.
    #[must_use]
    pub fn user_episodes(&self) -> &Repository<UserEpisodeService> {
        &self.user_episodes
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
