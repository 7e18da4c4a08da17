//! In-memory journal for tests and ephemeral databases.

use crate::backend::JournalBackend;
use crate::error::StoreResult;

/// A journal held entirely in memory.
///
/// Contents are lost when the handle is dropped, which makes this
/// backend the right choice for unit tests and throwaway development
/// databases.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    buf: Vec<u8>,
}

impl MemoryJournal {
    /// Creates a new empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a journal seeded with existing bytes.
    ///
    /// Useful for replay and corruption tests.
    #[must_use]
    pub fn with_bytes(buf: Vec<u8>) -> Self {
        Self { buf }
    }
}

impl JournalBackend for MemoryJournal {
    fn append(&mut self, bytes: &[u8]) -> StoreResult<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn read_all(&self) -> StoreResult<Vec<u8>> {
        Ok(self.buf.clone())
    }

    fn flush(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn reset(&mut self) -> StoreResult<()> {
        self.buf.clear();
        Ok(())
    }

    fn len(&self) -> StoreResult<u64> {
        Ok(self.buf.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read() {
        let mut journal = MemoryJournal::new();
        journal.append(b"alpha").unwrap();
        journal.append(b"beta").unwrap();

        assert_eq!(journal.read_all().unwrap(), b"alphabeta");
        assert_eq!(journal.len().unwrap(), 9);
        assert!(!journal.is_empty().unwrap());
    }

    #[test]
    fn reset_empties() {
        let mut journal = MemoryJournal::with_bytes(b"seed".to_vec());
        journal.reset().unwrap();
        assert!(journal.is_empty().unwrap());
    }
}
