//! Transactions and bucket handles.

use crate::error::{StoreError, StoreResult};
use crate::store::StoreInner;
use parking_lot::MutexGuard;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// Writes buffered by a transaction, keyed by (bucket, key).
///
/// `None` values are deletions. A `BTreeMap` keeps the commit record
/// deterministic.
#[derive(Debug, Default)]
pub(crate) struct TxPending {
    pub(crate) writes: BTreeMap<(u32, Vec<u8>), Option<Vec<u8>>>,
    /// Last sequence value drawn per bucket.
    pub(crate) sequences: HashMap<u32, u64>,
}

/// A transaction against a [`crate::Store`].
///
/// Read-only transactions see a consistent snapshot taken at begin.
/// Writable transactions additionally buffer puts, deletes and sequence
/// draws; the buffer is published atomically at commit or dropped on
/// rollback. A writable transaction observes its own buffered writes.
pub struct Tx<'s> {
    inner: &'s StoreInner,
    snapshot: u64,
    writable: bool,
    pending: RefCell<TxPending>,
    /// Held for the lifetime of a writable transaction.
    _guard: Option<MutexGuard<'s, ()>>,
}

impl<'s> Tx<'s> {
    pub(crate) fn new(
        inner: &'s StoreInner,
        snapshot: u64,
        writable: bool,
        guard: Option<MutexGuard<'s, ()>>,
    ) -> Self {
        Self {
            inner,
            snapshot,
            writable,
            pending: RefCell::new(TxPending::default()),
            _guard: guard,
        }
    }

    pub(crate) fn into_parts(self) -> (TxPending, Option<MutexGuard<'s, ()>>) {
        (self.pending.into_inner(), self._guard)
    }

    /// Returns whether this transaction accepts mutations.
    #[must_use]
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// Returns the snapshot sequence this transaction reads at.
    #[must_use]
    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    /// Resolves a bucket by name.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::BucketNotFound`] if the bucket does not
    /// exist in this store.
    pub fn bucket(&self, name: &str) -> StoreResult<Bucket<'_, 's>> {
        let id = self
            .inner
            .state
            .read()
            .bucket_id(name)
            .ok_or_else(|| StoreError::BucketNotFound {
                name: name.to_string(),
            })?;
        Ok(Bucket { tx: self, id })
    }

    fn require_writable(&self) -> StoreResult<()> {
        if self.writable {
            Ok(())
        } else {
            Err(StoreError::ReadOnly)
        }
    }
}

impl std::fmt::Debug for Tx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("snapshot", &self.snapshot)
            .field("writable", &self.writable)
            .finish_non_exhaustive()
    }
}

/// A handle to one bucket within a transaction.
#[derive(Debug, Clone, Copy)]
pub struct Bucket<'t, 's> {
    tx: &'t Tx<'s>,
    id: u32,
}

impl Bucket<'_, '_> {
    /// Reads the value stored under `key`, if any.
    ///
    /// In a writable transaction, the transaction's own buffered writes
    /// take precedence over committed state.
    pub fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        if self.tx.writable {
            let pending = self.tx.pending.borrow();
            if let Some(value) = pending.writes.get(&(self.id, key.to_vec())) {
                return Ok(value.clone());
            }
        }
        let state = self.tx.inner.state.read();
        Ok(state.buckets[self.id as usize].visible(key, self.tx.snapshot))
    }

    /// Buffers a put of `value` under `key`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.tx.require_writable()?;
        self.tx
            .pending
            .borrow_mut()
            .writes
            .insert((self.id, key.to_vec()), Some(value.to_vec()));
        Ok(())
    }

    /// Buffers a deletion of `key`.
    ///
    /// Deleting a key that does not exist is not an error.
    pub fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.tx.require_writable()?;
        self.tx
            .pending
            .borrow_mut()
            .writes
            .insert((self.id, key.to_vec()), None);
        Ok(())
    }

    /// Draws the next value of this bucket's sequence counter.
    ///
    /// The counter is persistent and monotonically increasing; values
    /// are never reused once the transaction commits. Draws from a
    /// rolled-back transaction are discarded with it.
    pub fn next_sequence(&self) -> StoreResult<u64> {
        self.tx.require_writable()?;

        let mut pending = self.tx.pending.borrow_mut();
        let current = match pending.sequences.get(&self.id) {
            Some(&drawn) => drawn,
            None => {
                self.tx.inner.state.read().buckets[self.id as usize].sequence
            }
        };
        let next = current + 1;
        pending.sequences.insert(self.id, next);
        Ok(next)
    }

    /// Scans the bucket in ascending key order.
    ///
    /// The scan observes the transaction's snapshot with its own
    /// buffered writes overlaid. Keys are raw bytes, so big-endian
    /// encoded integer keys come back in ascending numeric order.
    pub fn scan(&self) -> StoreResult<Scan> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        {
            let state = self.tx.inner.state.read();
            let bucket = &state.buckets[self.id as usize];
            for key in bucket.revisions.keys() {
                if let Some(value) = bucket.visible(key, self.tx.snapshot) {
                    merged.insert(key.clone(), value);
                }
            }
        }

        if self.tx.writable {
            let pending = self.tx.pending.borrow();
            for (slot, value) in pending.writes.iter() {
                let (bucket, key) = slot;
                if *bucket != self.id {
                    continue;
                }
                match value {
                    Some(bytes) => {
                        merged.insert(key.clone(), bytes.clone());
                    }
                    None => {
                        merged.remove(key);
                    }
                }
            }
        }

        Ok(Scan {
            entries: merged.into_iter(),
        })
    }
}

/// An ascending-order iterator over a bucket's `(key, value)` pairs.
pub struct Scan {
    entries: std::collections::btree_map::IntoIter<Vec<u8>, Vec<u8>>,
}

impl Iterator for Scan {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Scan {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Store, StoreOptions};

    fn store() -> Store {
        Store::open_in_memory(StoreOptions::new().buckets(["items"])).unwrap()
    }

    #[test]
    fn writable_tx_sees_its_own_writes() {
        let store = store();

        store
            .update::<_, StoreError, _>(|tx| {
                let bucket = tx.bucket("items")?;
                assert!(bucket.get(b"k")?.is_none());

                bucket.put(b"k", b"v")?;
                assert_eq!(bucket.get(b"k")?, Some(b"v".to_vec()));

                bucket.delete(b"k")?;
                assert!(bucket.get(b"k")?.is_none());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn read_only_tx_rejects_sequence_draws() {
        let store = store();
        let result = store.view::<u64, StoreError, _>(|tx| tx.bucket("items")?.next_sequence());
        assert!(matches!(result, Err(StoreError::ReadOnly)));
    }

    #[test]
    fn tx_flags() {
        let store = store();
        store
            .view::<_, StoreError, _>(|tx| {
                assert!(!tx.writable());
                Ok(())
            })
            .unwrap();
        store
            .update::<_, StoreError, _>(|tx| {
                assert!(tx.writable());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn scan_is_exact_size() {
        let store = store();
        store
            .update::<_, StoreError, _>(|tx| {
                let bucket = tx.bucket("items")?;
                for id in 1u64..=4 {
                    bucket.put(&id.to_be_bytes(), b"x")?;
                }
                Ok(())
            })
            .unwrap();

        store
            .view::<_, StoreError, _>(|tx| {
                let scan = tx.bucket("items")?.scan()?;
                assert_eq!(scan.len(), 4);
                Ok(())
            })
            .unwrap();
    }
}
