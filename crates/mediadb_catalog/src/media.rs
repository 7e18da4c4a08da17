//! Media entity and service.

use crate::impl_model;
use mediadb_core::{EngineError, EngineResult, Metadata, PersistHooks, Service, Tx};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A title of a media record in one language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Title {
    /// BCP-47-ish language tag, e.g. `"ja"` or `"en"`.
    pub language: String,
    /// The title text.
    pub text: String,
}

impl Title {
    /// Creates a title.
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Release status of a media record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseStatus {
    /// Fully released.
    Finished,
    /// Currently airing/publishing.
    Releasing,
    /// Announced but not yet released.
    Unreleased,
}

/// A catalogued series, film or other work.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Media {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// Titles in one or more languages; at least one is required.
    pub titles: Vec<Title>,
    /// Plot synopsis.
    pub synopsis: String,
    /// Number of episodes, when known.
    pub episode_count: Option<u32>,
    /// Release status, when known.
    pub status: Option<ReleaseStatus>,
}

impl_model!(Media);

/// Service descriptor for [`Media`].
pub struct MediaService {
    hooks: PersistHooks<Media>,
}

impl MediaService {
    /// Bucket holding media records.
    pub const BUCKET: &'static str = "media";

    /// Creates the service.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            hooks: PersistHooks::new(),
        })
    }
}

impl Service for MediaService {
    type Entity = Media;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn clean(&self, _tx: &Tx<'_>, entity: &mut Media) -> EngineResult<()> {
        for title in &mut entity.titles {
            title.language = title.language.trim().to_string();
            title.text = title.text.trim().to_string();
        }
        entity.synopsis = entity.synopsis.trim().to_string();
        Ok(())
    }

    fn validate(&self, _tx: &Tx<'_>, entity: &Media) -> EngineResult<()> {
        if entity.titles.is_empty() {
            return Err(EngineError::nil("media title"));
        }
        if entity.titles.iter().any(|t| t.text.is_empty()) {
            return Err(EngineError::validation("media titles must not be empty"));
        }
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<Media> {
        &self.hooks
    }
}
