//! # MediaDB Storage
//!
//! Bucketed, ordered, single-file key-value store for MediaDB.
//!
//! The store keeps its durable state in one append-only journal file and
//! serves reads from an in-memory multi-version index rebuilt at open.
//! Data is partitioned into named **buckets** (one per entity type), each
//! holding `key -> value` byte pairs in ascending key order plus a
//! persistent, monotonically increasing sequence counter.
//!
//! ## Concurrency model
//!
//! - One writable transaction at a time, process-wide (`Store::update`
//!   blocks until the write lock is free).
//! - Any number of concurrent read-only transactions (`Store::view`),
//!   each reading a consistent snapshot taken at begin. Readers never
//!   block writers and writers never block readers.
//!
//! ## Example
//!
//! ```rust
//! use mediadb_storage::{Store, StoreError, StoreOptions};
//!
//! let store = Store::open_in_memory(StoreOptions::new().buckets(["media"])).unwrap();
//! store
//!     .update::<_, StoreError, _>(|tx| {
//!         let bucket = tx.bucket("media")?;
//!         let id = bucket.next_sequence()?;
//!         bucket.put(&id.to_be_bytes(), b"payload")?;
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

mod backend;
mod error;
mod file;
mod frame;
mod memory;
mod store;
mod tx;

pub use backend::JournalBackend;
pub use error::{StoreError, StoreResult};
pub use file::FileJournal;
pub use frame::{JournalRecord, WriteOp};
pub use memory::MemoryJournal;
pub use store::{Store, StoreOptions};
pub use tx::{Bucket, Scan, Tx};
