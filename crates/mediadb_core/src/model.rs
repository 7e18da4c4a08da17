//! Model contract and record metadata.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Identifier of a persisted record.
///
/// IDs are assigned by the engine from the bucket's sequence counter on
/// creation; they are unique within a bucket, immutable, and never
/// reused. The storage key of a record is the big-endian encoding of
/// its ID, which makes byte order equal numeric order in bucket scans.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Creates an entity ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Encodes the ID as its 8-byte big-endian storage key.
    #[must_use]
    pub const fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Decodes an ID from a storage key.
    ///
    /// Returns `None` if the key is not exactly 8 bytes.
    #[must_use]
    pub fn from_key(key: &[u8]) -> Option<Self> {
        let bytes: [u8; 8] = key.try_into().ok()?;
        Some(Self(u64::from_be_bytes(bytes)))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Engine-managed metadata carried by every persisted record.
///
/// Callers never set these fields themselves: the ID comes from the
/// bucket sequence at create, the timestamps are stamped by the engine,
/// and the version increments by exactly one per successful update
/// (any caller-supplied value is discarded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Record identifier, unique within the bucket.
    pub id: EntityId,
    /// Creation time, unix milliseconds.
    pub created_at: u64,
    /// Last update time, unix milliseconds.
    pub updated_at: u64,
    /// Optimistic version counter, starting at 0.
    pub version: u64,
}

/// A persisted entity.
///
/// Implementors are plain serde structs that expose their [`Metadata`]
/// for the engine to manage. Everything else about the record belongs
/// to the entity's own service.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Returns the record's metadata.
    fn meta(&self) -> &Metadata;

    /// Returns the record's metadata for the engine to mutate.
    fn meta_mut(&mut self) -> &mut Metadata;
}

/// Returns the current wall-clock time in unix milliseconds.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
