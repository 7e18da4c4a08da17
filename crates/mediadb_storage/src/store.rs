//! Store facade: open, replay, transactions, commit.

use crate::backend::JournalBackend;
use crate::error::{StoreError, StoreResult};
use crate::file::FileJournal;
use crate::frame::{decode_frames, encode_frame, JournalRecord, WriteOp};
use crate::memory::MemoryJournal;
use crate::tx::{Tx, TxPending};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Options for opening a [`Store`].
///
/// The bucket list is explicit configuration: callers name every bucket
/// they need and the store creates the missing ones at open.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Buckets to create if absent.
    pub buckets: Vec<String>,
    /// POSIX mode applied to a newly created store file (Unix only).
    pub file_mode: Option<u32>,
    /// Whether to fsync the journal on every commit. Defaults to `true`.
    pub sync_on_commit: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            file_mode: None,
            sync_on_commit: true,
        }
    }
}

impl StoreOptions {
    /// Creates options with defaults: no buckets, no mode, sync on commit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the buckets to create at open.
    #[must_use]
    pub fn buckets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets = names.into_iter().map(Into::into).collect();
        self
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

/// One version of a value, tagged with its commit sequence.
#[derive(Debug)]
pub(crate) struct Revision {
    pub(crate) seq: u64,
    /// `None` marks a deletion.
    pub(crate) value: Option<Vec<u8>>,
}

/// In-memory state of a single bucket.
#[derive(Debug)]
pub(crate) struct BucketState {
    pub(crate) name: String,
    pub(crate) sequence: u64,
    /// Key -> revisions in ascending commit order.
    pub(crate) revisions: BTreeMap<Vec<u8>, Vec<Revision>>,
}

impl BucketState {
    fn new(name: String) -> Self {
        Self {
            name,
            sequence: 0,
            revisions: BTreeMap::new(),
        }
    }

    /// Resolves the value visible at `snapshot`, if any.
    pub(crate) fn visible(&self, key: &[u8], snapshot: u64) -> Option<Vec<u8>> {
        self.revisions
            .get(key)
            .and_then(|revs| revs.iter().rev().find(|r| r.seq <= snapshot))
            .and_then(|r| r.value.clone())
    }

    fn apply(&mut self, key: Vec<u8>, value: Option<Vec<u8>>, seq: u64) {
        self.revisions
            .entry(key)
            .or_default()
            .push(Revision { seq, value });
    }
}

/// In-memory state of the whole store.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    /// Buckets indexed by creation order.
    pub(crate) buckets: Vec<BucketState>,
    /// Name -> bucket index.
    pub(crate) names: HashMap<String, u32>,
}

impl StoreState {
    pub(crate) fn bucket_id(&self, name: &str) -> Option<u32> {
        self.names.get(name).copied()
    }

    fn create_bucket(&mut self, name: &str) -> u32 {
        if let Some(id) = self.bucket_id(name) {
            return id;
        }
        let id = self.buckets.len() as u32;
        self.buckets.push(BucketState::new(name.to_string()));
        self.names.insert(name.to_string(), id);
        id
    }
}

pub(crate) struct StoreInner {
    pub(crate) journal: Mutex<Box<dyn JournalBackend>>,
    pub(crate) state: RwLock<StoreState>,
    pub(crate) committed_seq: AtomicU64,
    pub(crate) write_lock: Mutex<()>,
    sync_on_commit: bool,
    configured_buckets: Vec<String>,
}

/// A bucketed, ordered, single-file key-value store.
///
/// Cloning a `Store` clones a handle to the same underlying store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Opens or creates the store file at `path`.
    ///
    /// Replays the journal to rebuild bucket contents and sequence
    /// counters, then creates any configured buckets that are missing.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::Locked`] when another process holds the
    /// file, [`StoreError::Corrupted`] on unreadable journal contents,
    /// or an I/O error if the file cannot be opened.
    pub fn open(path: &Path, options: StoreOptions) -> StoreResult<Self> {
        let journal = FileJournal::open(path, options.file_mode)?;
        Self::from_backend(Box::new(journal), options)
    }

    /// Opens a fresh in-memory store for tests and ephemeral databases.
    pub fn open_in_memory(options: StoreOptions) -> StoreResult<Self> {
        Self::from_backend(Box::new(MemoryJournal::new()), options)
    }

    /// Opens a store over an arbitrary journal backend.
    pub fn from_backend(
        backend: Box<dyn JournalBackend>,
        options: StoreOptions,
    ) -> StoreResult<Self> {
        let image = backend.read_all()?;
        let records = decode_frames(&image)?;

        let mut state = StoreState::default();
        let mut committed = 0u64;
        let mut replayed = 0usize;

        for record in records {
            match record {
                JournalRecord::Buckets { names } => {
                    for name in &names {
                        state.create_bucket(name);
                    }
                }
                JournalRecord::Commit {
                    seq,
                    sequences,
                    writes,
                } => {
                    apply_commit(&mut state, seq, &sequences, writes)?;
                    committed = committed.max(seq);
                    replayed += 1;
                }
            }
        }

        let inner = Arc::new(StoreInner {
            journal: Mutex::new(backend),
            state: RwLock::new(state),
            committed_seq: AtomicU64::new(committed),
            write_lock: Mutex::new(()),
            sync_on_commit: options.sync_on_commit,
            configured_buckets: options.buckets.clone(),
        });
        let store = Self { inner };

        debug!(commits = replayed, seq = committed, "journal replayed");
        store.ensure_buckets()?;
        Ok(store)
    }

    /// Creates configured buckets that do not exist yet.
    fn ensure_buckets(&self) -> StoreResult<()> {
        let _guard = self.inner.write_lock.lock();

        let missing: Vec<String> = {
            let state = self.inner.state.read();
            self.inner
                .configured_buckets
                .iter()
                .filter(|name| state.bucket_id(name).is_none())
                .cloned()
                .collect()
        };
        if missing.is_empty() {
            return Ok(());
        }

        let frame = encode_frame(&JournalRecord::Buckets {
            names: missing.clone(),
        })?;
        {
            let mut journal = self.inner.journal.lock();
            journal.append(&frame)?;
            journal.flush()?;
            if self.inner.sync_on_commit {
                journal.sync()?;
            }
        }

        let mut state = self.inner.state.write();
        for name in &missing {
            state.create_bucket(name);
        }
        debug!(buckets = missing.len(), "created missing buckets");
        Ok(())
    }

    /// Runs `f` in a read-only transaction.
    ///
    /// The transaction reads a consistent snapshot taken at begin and
    /// never blocks on writers. Nothing is committed.
    pub fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Tx<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let tx = Tx::new(self.inner.as_ref(), self.committed_seq(), false, None);
        f(&tx)
    }

    /// Runs `f` in a writable transaction.
    ///
    /// Blocks until the process-wide write lock is available. Commits
    /// when `f` returns `Ok`; otherwise every buffered write is
    /// discarded. A panic inside `f` also publishes nothing: buffered
    /// writes live only in the transaction and the lock releases on
    /// unwind.
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Tx<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let guard = self.inner.write_lock.lock();
        let tx = Tx::new(self.inner.as_ref(), self.committed_seq(), true, Some(guard));

        let value = f(&tx)?;
        let (pending, _guard) = tx.into_parts();
        self.commit_pending(pending).map_err(E::from)?;
        Ok(value)
    }

    /// Persists and applies a transaction's buffered writes.
    fn commit_pending(&self, pending: TxPending) -> StoreResult<()> {
        if pending.writes.is_empty() && pending.sequences.is_empty() {
            return Ok(());
        }

        let seq = self.committed_seq() + 1;
        let mut sequences: Vec<(u32, u64)> = pending.sequences.into_iter().collect();
        sequences.sort_unstable();
        let writes: Vec<WriteOp> = pending
            .writes
            .into_iter()
            .map(|((bucket, key), value)| WriteOp { bucket, key, value })
            .collect();
        let write_count = writes.len();

        let frame = encode_frame(&JournalRecord::Commit {
            seq,
            sequences: sequences.clone(),
            writes: writes.clone(),
        })?;
        {
            let mut journal = self.inner.journal.lock();
            journal.append(&frame)?;
            journal.flush()?;
            if self.inner.sync_on_commit {
                journal.sync()?;
            }
        }

        {
            let mut state = self.inner.state.write();
            apply_commit(&mut state, seq, &sequences, writes)?;
        }
        self.inner.committed_seq.store(seq, Ordering::SeqCst);

        debug!(seq, writes = write_count, "commit applied");
        Ok(())
    }

    /// Returns the latest committed sequence number.
    #[must_use]
    pub fn committed_seq(&self) -> u64 {
        self.inner.committed_seq.load(Ordering::SeqCst)
    }

    /// Returns the bucket names in creation order.
    #[must_use]
    pub fn bucket_names(&self) -> Vec<String> {
        self.inner
            .state
            .read()
            .buckets
            .iter()
            .map(|b| b.name.clone())
            .collect()
    }

    /// Wipes all buckets and the journal, then recreates the configured
    /// buckets.
    ///
    /// Intended for test teardown and ephemeral development databases;
    /// snapshots taken before `clear` must not be used afterwards.
    pub fn clear(&self) -> StoreResult<()> {
        {
            let _guard = self.inner.write_lock.lock();
            self.inner.journal.lock().reset()?;
            *self.inner.state.write() = StoreState::default();
            self.inner.committed_seq.store(0, Ordering::SeqCst);
        }
        self.ensure_buckets()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("committed_seq", &self.committed_seq())
            .field("buckets", &self.bucket_names())
            .finish_non_exhaustive()
    }
}

/// Applies one commit's sequences and writes to the state.
fn apply_commit(
    state: &mut StoreState,
    seq: u64,
    sequences: &[(u32, u64)],
    writes: Vec<WriteOp>,
) -> StoreResult<()> {
    let bucket_count = state.buckets.len() as u32;
    for &(bucket, counter) in sequences {
        if bucket >= bucket_count {
            return Err(StoreError::corrupted(format!(
                "commit {seq} references unknown bucket {bucket}"
            )));
        }
        let slot = &mut state.buckets[bucket as usize];
        slot.sequence = slot.sequence.max(counter);
    }
    for op in writes {
        if op.bucket >= bucket_count {
            return Err(StoreError::corrupted(format!(
                "commit {seq} references unknown bucket {}",
                op.bucket
            )));
        }
        state.buckets[op.bucket as usize].apply(op.key, op.value, seq);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(buckets: &[&str]) -> Store {
        Store::open_in_memory(StoreOptions::new().buckets(buckets.iter().copied())).unwrap()
    }

    #[test]
    fn creates_configured_buckets() {
        let store = open(&["media", "users"]);
        assert_eq!(store.bucket_names(), vec!["media", "users"]);
    }

    #[test]
    fn put_get_delete() {
        let store = open(&["media"]);

        store
            .update::<_, StoreError, _>(|tx| {
                tx.bucket("media")?.put(b"k1", b"v1")?;
                Ok(())
            })
            .unwrap();

        let value = store
            .view::<_, StoreError, _>(|tx| tx.bucket("media")?.get(b"k1"))
            .unwrap();
        assert_eq!(value, Some(b"v1".to_vec()));

        store
            .update::<_, StoreError, _>(|tx| tx.bucket("media")?.delete(b"k1"))
            .unwrap();

        let value = store
            .view::<_, StoreError, _>(|tx| tx.bucket("media")?.get(b"k1"))
            .unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn unknown_bucket_fails() {
        let store = open(&["media"]);
        let result = store.view::<_, StoreError, _>(|tx| tx.bucket("nope").map(|_| ()));
        assert!(matches!(result, Err(StoreError::BucketNotFound { .. })));
    }

    #[test]
    fn mutation_in_view_fails() {
        let store = open(&["media"]);
        let result = store.view::<_, StoreError, _>(|tx| tx.bucket("media")?.put(b"k", b"v"));
        assert!(matches!(result, Err(StoreError::ReadOnly)));
    }

    #[test]
    fn failed_update_publishes_nothing() {
        let store = open(&["media"]);

        let result = store.update::<(), StoreError, _>(|tx| {
            tx.bucket("media")?.put(b"k", b"v")?;
            Err(StoreError::corrupted("forced failure"))
        });
        assert!(result.is_err());

        let value = store
            .view::<_, StoreError, _>(|tx| tx.bucket("media")?.get(b"k"))
            .unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn sequences_are_monotonic_per_bucket() {
        let store = open(&["media", "users"]);

        let (a, b, other) = store
            .update::<_, StoreError, _>(|tx| {
                let media = tx.bucket("media")?;
                let a = media.next_sequence()?;
                let b = media.next_sequence()?;
                let other = tx.bucket("users")?.next_sequence()?;
                Ok((a, b, other))
            })
            .unwrap();

        assert_eq!((a, b), (1, 2));
        assert_eq!(other, 1);

        let c = store
            .update::<_, StoreError, _>(|tx| tx.bucket("media")?.next_sequence())
            .unwrap();
        assert_eq!(c, 3);
    }

    #[test]
    fn rolled_back_sequence_draws_are_not_published() {
        let store = open(&["media"]);

        let result = store.update::<u64, StoreError, _>(|tx| {
            tx.bucket("media")?.next_sequence()?;
            Err(StoreError::corrupted("forced failure"))
        });
        assert!(result.is_err());

        // The draw above was discarded with the transaction.
        let seq = store
            .update::<_, StoreError, _>(|tx| tx.bucket("media")?.next_sequence())
            .unwrap();
        assert_eq!(seq, 1);
    }

    #[test]
    fn scan_is_in_ascending_key_order() {
        let store = open(&["media"]);

        store
            .update::<_, StoreError, _>(|tx| {
                let bucket = tx.bucket("media")?;
                for id in [3u64, 1, 2] {
                    bucket.put(&id.to_be_bytes(), &[id as u8])?;
                }
                Ok(())
            })
            .unwrap();

        let keys: Vec<Vec<u8>> = store
            .view::<_, StoreError, _>(|tx| Ok(tx.bucket("media")?.scan()?.map(|(k, _)| k).collect()))
            .unwrap();
        assert_eq!(
            keys,
            vec![
                1u64.to_be_bytes().to_vec(),
                2u64.to_be_bytes().to_vec(),
                3u64.to_be_bytes().to_vec(),
            ]
        );
    }

    #[test]
    fn scan_sees_own_uncommitted_writes() {
        let store = open(&["media"]);

        store
            .update::<_, StoreError, _>(|tx| {
                tx.bucket("media")?.put(&1u64.to_be_bytes(), b"old")?;
                Ok(())
            })
            .unwrap();

        store
            .update::<_, StoreError, _>(|tx| {
                let bucket = tx.bucket("media")?;
                bucket.put(&2u64.to_be_bytes(), b"new")?;
                bucket.delete(&1u64.to_be_bytes())?;

                let entries: Vec<_> = bucket.scan()?.collect();
                assert_eq!(entries, vec![(2u64.to_be_bytes().to_vec(), b"new".to_vec())]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn snapshot_isolation_for_readers() {
        let store = open(&["media"]);

        store
            .update::<_, StoreError, _>(|tx| tx.bucket("media")?.put(b"k", b"v1"))
            .unwrap();

        // A reader that begins before a concurrent write commits keeps
        // seeing the pre-write snapshot.
        store
            .view::<_, StoreError, _>(|tx| {
                let before = tx.bucket("media")?.get(b"k")?;
                assert_eq!(before, Some(b"v1".to_vec()));

                store
                    .update::<_, StoreError, _>(|wtx| wtx.bucket("media")?.put(b"k", b"v2"))
                    .unwrap();

                let after = tx.bucket("media")?.get(b"k")?;
                assert_eq!(after, Some(b"v1".to_vec()));
                Ok(())
            })
            .unwrap();

        let latest = store
            .view::<_, StoreError, _>(|tx| tx.bucket("media")?.get(b"k"))
            .unwrap();
        assert_eq!(latest, Some(b"v2".to_vec()));
    }

    #[test]
    fn writers_serialize() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        let store = open(&["media"]);
        let highest = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let highest = Arc::clone(&highest);
            handles.push(std::thread::spawn(move || {
                for _ in 0..25 {
                    let seq = store
                        .update::<_, StoreError, _>(|tx| tx.bucket("media")?.next_sequence())
                        .unwrap();
                    highest.fetch_max(seq, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // 100 draws across 4 writers, each fully serialized.
        assert_eq!(highest.load(Ordering::SeqCst), 100);
        assert_eq!(store.committed_seq(), 100);
    }

    #[test]
    fn reopen_restores_contents_and_sequences() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let options = || StoreOptions::new().buckets(["media"]);

        {
            let store = Store::open(&path, options()).unwrap();
            store
                .update::<_, StoreError, _>(|tx| {
                    let bucket = tx.bucket("media")?;
                    let id = bucket.next_sequence()?;
                    bucket.put(&id.to_be_bytes(), b"persisted")?;
                    Ok(())
                })
                .unwrap();
        }

        let store = Store::open(&path, options()).unwrap();
        let value = store
            .view::<_, StoreError, _>(|tx| tx.bucket("media")?.get(&1u64.to_be_bytes()))
            .unwrap();
        assert_eq!(value, Some(b"persisted".to_vec()));

        // The sequence counter continues where it left off.
        let next = store
            .update::<_, StoreError, _>(|tx| tx.bucket("media")?.next_sequence())
            .unwrap();
        assert_eq!(next, 2);
    }

    #[test]
    fn clear_wipes_and_recreates_buckets() {
        let store = open(&["media", "users"]);

        store
            .update::<_, StoreError, _>(|tx| tx.bucket("media")?.put(b"k", b"v"))
            .unwrap();

        store.clear().unwrap();

        assert_eq!(store.bucket_names(), vec!["media", "users"]);
        let value = store
            .view::<_, StoreError, _>(|tx| tx.bucket("media")?.get(b"k"))
            .unwrap();
        assert!(value.is_none());
        assert_eq!(store.committed_seq(), 0);
    }
}
