//! Journal backend trait definition.

use crate::error::StoreResult;

/// The append-only byte device underneath a [`crate::Store`].
///
/// Backends are opaque: they hold journal frames but never interpret
/// them. The store owns framing, checksums and replay; a backend only
/// needs to get bytes onto (and back off) its medium.
///
/// # Invariants
///
/// - `append` adds bytes at the end, in call order
/// - `read_all` returns every byte appended since the last `reset`
/// - after `sync` returns, appended bytes survive process termination
///
/// # Implementors
///
/// - [`crate::FileJournal`] for persistent stores
/// - [`crate::MemoryJournal`] for tests and ephemeral databases
pub trait JournalBackend: Send + Sync {
    /// Appends a block of bytes to the end of the journal.
    fn append(&mut self, bytes: &[u8]) -> StoreResult<()>;

    /// Reads the entire journal contents.
    fn read_all(&self) -> StoreResult<Vec<u8>>;

    /// Pushes buffered writes to the OS.
    fn flush(&mut self) -> StoreResult<()>;

    /// Forces all written data onto durable storage.
    fn sync(&mut self) -> StoreResult<()>;

    /// Discards the journal contents entirely.
    fn reset(&mut self) -> StoreResult<()>;

    /// Returns the journal length in bytes.
    fn len(&self) -> StoreResult<u64>;

    /// Returns `true` if the journal holds no bytes.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}
