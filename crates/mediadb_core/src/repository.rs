//! The generic CRUD engine.

use crate::error::{EngineError, EngineResult};
use crate::model::{now_millis, EntityId, Model};
use crate::service::Service;
use mediadb_storage::{Bucket, Tx};
use std::sync::Arc;
use tracing::debug;

/// The generic CRUD engine, instantiated once per entity type.
///
/// A repository binds the engine statically to one [`Service`] (and
/// through it one [`Model`] type); there is no dynamic typing anywhere
/// in the write path. Repositories are cheap handles around an `Arc`
/// of their service and can be cloned freely.
///
/// All operations run inside a caller-supplied transaction: mutating
/// operations require a writable one, reads work in either. Nothing is
/// retried — an error rolls the caller's transaction back whole.
pub struct Repository<S: Service> {
    service: Arc<S>,
}

impl<S: Service> Clone for Repository<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: Service> Repository<S> {
    /// Creates a repository over a service.
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Returns the underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Persists a new record and returns its assigned ID.
    ///
    /// Cleans and validates first, then draws the bucket sequence for
    /// the ID, applies entity defaults, stamps metadata (version 0,
    /// `created_at == updated_at`), and writes the record with the
    /// create hooks around the write.
    pub fn create(&self, tx: &Tx<'_>, entity: &mut S::Entity) -> EngineResult<EntityId> {
        self.require_writable(tx)?;
        self.service.clean(tx, entity)?;
        self.service.validate(tx, entity)?;

        let bucket = self.bucket(tx)?;
        let id = EntityId::new(bucket.next_sequence()?);
        entity.meta_mut().id = id;
        self.service.initialize(tx, entity)?;

        let now = now_millis();
        let meta = entity.meta_mut();
        meta.created_at = now;
        meta.updated_at = now;
        meta.version = 0;

        self.service.hooks().run_pre_create(tx, entity)?;
        let bytes = self.service.marshal(entity)?;
        bucket.put(&id.to_key(), &bytes)?;
        self.service.hooks().run_post_create(tx, entity)?;

        debug!(bucket = self.service.bucket(), %id, "record created");
        Ok(id)
    }

    /// Overwrites the stored record with the caller's version of it.
    ///
    /// Fails with [`EngineError::NotFound`] if no record exists under
    /// the entity's ID — update never upserts. The stored record is
    /// fetched first so frozen fields survive: ID and creation time are
    /// restored, the version becomes `stored.version + 1` no matter
    /// what the caller supplied, and the service carries over its own
    /// immutable fields in `persist_old_properties`.
    pub fn update(&self, tx: &Tx<'_>, entity: &mut S::Entity) -> EngineResult<()> {
        self.require_writable(tx)?;
        self.service.clean(tx, entity)?;
        self.service.validate(tx, entity)?;

        let bucket = self.bucket(tx)?;
        let id = entity.meta().id;
        let old_bytes = bucket
            .get(&id.to_key())?
            .ok_or_else(|| EngineError::not_found(self.service.bucket(), id))?;
        let old = self.service.unmarshal(&old_bytes)?;

        {
            let old_meta = *old.meta();
            let meta = entity.meta_mut();
            meta.id = old_meta.id;
            meta.created_at = old_meta.created_at;
            meta.version = old_meta.version + 1;
        }
        self.service.persist_old_properties(tx, entity, &old)?;
        entity.meta_mut().updated_at = now_millis();

        self.service.hooks().run_pre_update(tx, entity)?;
        let bytes = self.service.marshal(entity)?;
        bucket.put(&id.to_key(), &bytes)?;
        self.service.hooks().run_post_update(tx, entity)?;

        debug!(
            bucket = self.service.bucket(),
            %id,
            version = entity.meta().version,
            "record updated"
        );
        Ok(())
    }

    /// Deletes the record with the given ID.
    ///
    /// Deleting an absent ID succeeds without running any hooks. When
    /// the record exists it is fetched first so the pre-delete hooks —
    /// the cascade mechanism — see its fields, then removed, then the
    /// post-delete hooks run. Everything happens inside the caller's
    /// transaction, so a failing cascade aborts the delete as well.
    pub fn delete(&self, tx: &Tx<'_>, id: EntityId) -> EngineResult<()> {
        self.require_writable(tx)?;

        let bucket = self.bucket(tx)?;
        let Some(bytes) = bucket.get(&id.to_key())? else {
            return Ok(());
        };
        let entity = self.service.unmarshal(&bytes)?;

        self.service.hooks().run_pre_delete(tx, &entity)?;
        bucket.delete(&id.to_key())?;
        self.service.hooks().run_post_delete(tx, &entity)?;

        debug!(bucket = self.service.bucket(), %id, "record deleted");
        Ok(())
    }

    /// Fetches a record by ID.
    pub fn get_by_id(&self, tx: &Tx<'_>, id: EntityId) -> EngineResult<S::Entity> {
        let bytes = self
            .bucket(tx)?
            .get(&id.to_key())?
            .ok_or_else(|| EngineError::not_found(self.service.bucket(), id))?;
        self.service.unmarshal(&bytes)
    }

    /// Returns whether a record with the given ID exists.
    pub fn exists(&self, tx: &Tx<'_>, id: EntityId) -> EngineResult<bool> {
        Ok(self.bucket(tx)?.get(&id.to_key())?.is_some())
    }

    /// Fails with a validation error naming the missing reference if no
    /// record with the given ID exists.
    pub fn ensure_exists(&self, tx: &Tx<'_>, id: EntityId) -> EngineResult<()> {
        if self.exists(tx, id)? {
            Ok(())
        } else {
            Err(EngineError::validation(format!(
                "failed to get {} with id {id}",
                self.service.bucket()
            )))
        }
    }

    /// Returns a window of all records in ascending ID order.
    ///
    /// See [`Repository::get_filter`] for the `first`/`skip` semantics.
    pub fn get_all(
        &self,
        tx: &Tx<'_>,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<S::Entity>> {
        self.get_filter(tx, first, skip, |_| true)
    }

    /// Returns a window of the records matching `predicate`, scanning
    /// in ascending ID order.
    ///
    /// Forward-only pagination: after `skip` matching records are
    /// passed over, up to `first` matching records are collected.
    /// `skip` of `None` or ≤ 0 skips nothing; `first` of `None` or
    /// negative collects to the end of the bucket; `first` of 0
    /// collects nothing. There is no random-access seek — the cost is
    /// O(skip + first) unmarshals past the scan itself.
    pub fn get_filter<F>(
        &self,
        tx: &Tx<'_>,
        first: Option<i64>,
        skip: Option<i64>,
        predicate: F,
    ) -> EngineResult<Vec<S::Entity>>
    where
        F: Fn(&S::Entity) -> bool,
    {
        let (skip, first) = window(first, skip);
        if first == Some(0) {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut passed = 0usize;
        for (_, bytes) in self.bucket(tx)?.scan()? {
            let entity = self.service.unmarshal(&bytes)?;
            if !predicate(&entity) {
                continue;
            }
            if passed < skip {
                passed += 1;
                continue;
            }
            results.push(entity);
            if first.is_some_and(|limit| results.len() >= limit) {
                break;
            }
        }
        Ok(results)
    }

    /// Returns a window of the records with the given IDs, fetched in
    /// caller order.
    ///
    /// Pagination behaves exactly as in [`Repository::get_filter`], but
    /// over the caller's ID list instead of the whole bucket. An ID
    /// with no record aborts the whole call with
    /// [`EngineError::NotFound`] rather than being skipped.
    pub fn get_multiple<F>(
        &self,
        tx: &Tx<'_>,
        ids: &[EntityId],
        first: Option<i64>,
        skip: Option<i64>,
        predicate: F,
    ) -> EngineResult<Vec<S::Entity>>
    where
        F: Fn(&S::Entity) -> bool,
    {
        let (skip, first) = window(first, skip);
        if first == Some(0) {
            return Ok(Vec::new());
        }

        let bucket = self.bucket(tx)?;
        let mut results = Vec::new();
        let mut passed = 0usize;
        for &id in ids {
            let bytes = bucket
                .get(&id.to_key())?
                .ok_or_else(|| EngineError::not_found(self.service.bucket(), id))?;
            let entity = self.service.unmarshal(&bytes)?;
            if !predicate(&entity) {
                continue;
            }
            if passed < skip {
                passed += 1;
                continue;
            }
            results.push(entity);
            if first.is_some_and(|limit| results.len() >= limit) {
                break;
            }
        }
        Ok(results)
    }

    /// Returns the first record (in ascending ID order) for which
    /// `matches` returns true, short-circuiting the scan.
    pub fn find_first<F>(&self, tx: &Tx<'_>, matches: F) -> EngineResult<Option<S::Entity>>
    where
        F: Fn(&S::Entity) -> bool,
    {
        for (_, bytes) in self.bucket(tx)?.scan()? {
            let entity = self.service.unmarshal(&bytes)?;
            if matches(&entity) {
                return Ok(Some(entity));
            }
        }
        Ok(None)
    }

    /// Deletes every record matching `predicate` and returns how many
    /// were removed.
    ///
    /// This is the scan-and-delete primitive cascading hooks are built
    /// on: each matching record goes through [`Repository::delete`], so
    /// its own delete hooks run and cascades chain. Cost is one full
    /// bucket scan — foreign keys are not indexed.
    pub fn delete_filter<F>(&self, tx: &Tx<'_>, predicate: F) -> EngineResult<usize>
    where
        F: Fn(&S::Entity) -> bool,
    {
        self.require_writable(tx)?;
        let doomed = self.get_filter(tx, None, None, predicate)?;
        let count = doomed.len();
        for record in doomed {
            self.delete(tx, record.meta().id)?;
        }
        Ok(count)
    }

    fn bucket<'t, 's>(&self, tx: &'t Tx<'s>) -> EngineResult<Bucket<'t, 's>> {
        Ok(tx.bucket(self.service.bucket())?)
    }

    fn require_writable(&self, tx: &Tx<'_>) -> EngineResult<()> {
        if tx.writable() {
            Ok(())
        } else {
            Err(EngineError::UnwritableTransaction)
        }
    }
}

impl<S: Service> std::fmt::Debug for Repository<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("bucket", &self.service.bucket())
            .finish_non_exhaustive()
    }
}

/// Normalizes `first`/`skip` into a skip count and an optional limit.
fn window(first: Option<i64>, skip: Option<i64>) -> (usize, Option<usize>) {
    let skip = skip.map_or(0, |s| s.max(0) as usize);
    let first = match first {
        Some(f) if f >= 0 => Some(f as usize),
        _ => None,
    };
    (skip, first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::PersistHooks;
    use crate::model::Metadata;
    use mediadb_storage::{Store, StoreOptions};
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(flatten)]
        meta: Metadata,
        body: String,
    }

    impl Note {
        fn new(body: &str) -> Self {
            Self {
                meta: Metadata::default(),
                body: body.to_string(),
            }
        }
    }

    impl Model for Note {
        fn meta(&self) -> &Metadata {
            &self.meta
        }
        fn meta_mut(&mut self) -> &mut Metadata {
            &mut self.meta
        }
    }

    struct NoteService {
        hooks: PersistHooks<Note>,
    }

    impl NoteService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                hooks: PersistHooks::new(),
            })
        }
    }

    impl Service for NoteService {
        type Entity = Note;

        fn bucket(&self) -> &'static str {
            "notes"
        }

        fn clean(&self, _tx: &Tx<'_>, entity: &mut Note) -> EngineResult<()> {
            entity.body = entity.body.trim().to_string();
            Ok(())
        }

        fn validate(&self, _tx: &Tx<'_>, entity: &Note) -> EngineResult<()> {
            if entity.body.is_empty() {
                return Err(EngineError::validation("note body must not be empty"));
            }
            Ok(())
        }

        fn hooks(&self) -> &PersistHooks<Note> {
            &self.hooks
        }
    }

    fn setup() -> (Store, Repository<NoteService>) {
        let store = Store::open_in_memory(StoreOptions::new().buckets(["notes"])).unwrap();
        (store, Repository::new(NoteService::new()))
    }

    fn seed(store: &Store, repo: &Repository<NoteService>, bodies: &[&str]) -> Vec<EntityId> {
        store
            .update::<_, EngineError, _>(|tx| {
                bodies
                    .iter()
                    .map(|body| repo.create(tx, &mut Note::new(body)))
                    .collect()
            })
            .unwrap()
    }

    #[test]
    fn create_assigns_increasing_ids_and_version_zero() {
        let (store, repo) = setup();

        let ids = seed(&store, &repo, &["a", "b", "c"]);
        assert_eq!(
            ids,
            vec![EntityId::new(1), EntityId::new(2), EntityId::new(3)]
        );

        let note = store
            .view::<_, EngineError, _>(|tx| repo.get_by_id(tx, ids[0]))
            .unwrap();
        assert_eq!(note.meta().version, 0);
        assert_eq!(note.meta().created_at, note.meta().updated_at);
        assert!(note.meta().created_at > 0);
    }

    #[test]
    fn ids_are_not_reused_after_deletes() {
        let (store, repo) = setup();
        let ids = seed(&store, &repo, &["a", "b"]);

        store
            .update::<_, EngineError, _>(|tx| repo.delete(tx, ids[1]))
            .unwrap();

        let next = seed(&store, &repo, &["c"]);
        assert_eq!(next[0], EntityId::new(3));
    }

    #[test]
    fn create_runs_clean_and_validate() {
        let (store, repo) = setup();

        let id = store
            .update::<_, EngineError, _>(|tx| repo.create(tx, &mut Note::new("  padded  ")))
            .unwrap();
        let note = store
            .view::<_, EngineError, _>(|tx| repo.get_by_id(tx, id))
            .unwrap();
        assert_eq!(note.body, "padded");

        let result = store
            .update::<EntityId, EngineError, _>(|tx| repo.create(tx, &mut Note::new("   ")));
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn mutations_require_writable_transaction() {
        let (store, repo) = setup();
        let ids = seed(&store, &repo, &["a"]);

        let create = store.view::<EntityId, EngineError, _>(|tx| repo.create(tx, &mut Note::new("x")));
        assert!(matches!(create, Err(EngineError::UnwritableTransaction)));

        let delete = store.view::<(), EngineError, _>(|tx| repo.delete(tx, ids[0]));
        assert!(matches!(delete, Err(EngineError::UnwritableTransaction)));
    }

    #[test]
    fn update_increments_version_and_ignores_forged_values() {
        let (store, repo) = setup();
        let ids = seed(&store, &repo, &["original"]);

        store
            .update::<_, EngineError, _>(|tx| {
                let mut note = repo.get_by_id(tx, ids[0])?;
                note.body = "revised".into();
                note.meta_mut().version = 999;
                note.meta_mut().created_at = 1;
                repo.update(tx, &mut note)
            })
            .unwrap();

        let note = store
            .view::<_, EngineError, _>(|tx| repo.get_by_id(tx, ids[0]))
            .unwrap();
        assert_eq!(note.body, "revised");
        assert_eq!(note.meta().version, 1);
        assert!(note.meta().created_at > 1, "creation time is frozen");

        store
            .update::<_, EngineError, _>(|tx| {
                let mut note = repo.get_by_id(tx, ids[0])?;
                repo.update(tx, &mut note)
            })
            .unwrap();
        let note = store
            .view::<_, EngineError, _>(|tx| repo.get_by_id(tx, ids[0]))
            .unwrap();
        assert_eq!(note.meta().version, 2);
    }

    #[test]
    fn update_of_missing_record_is_not_an_upsert() {
        let (store, repo) = setup();

        let mut ghost = Note::new("ghost");
        ghost.meta_mut().id = EntityId::new(42);

        let result = store.update::<(), EngineError, _>(|tx| repo.update(tx, &mut ghost));
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn delete_of_absent_id_succeeds_without_hooks() {
        let (store, repo) = setup();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        repo.service().hooks().on_pre_delete(Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        store
            .update::<_, EngineError, _>(|tx| repo.delete(tx, EntityId::new(999)))
            .unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn delete_runs_hooks_around_removal() {
        let (store, repo) = setup();
        let ids = seed(&store, &repo, &["doomed"]);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        repo.service()
            .hooks()
            .on_pre_delete(Box::new(move |_, note: &Note| {
                log.lock().push(format!("pre:{}", note.body));
                Ok(())
            }));
        let log = Arc::clone(&seen);
        repo.service()
            .hooks()
            .on_post_delete(Box::new(move |_, note: &Note| {
                log.lock().push(format!("post:{}", note.body));
                Ok(())
            }));

        store
            .update::<_, EngineError, _>(|tx| repo.delete(tx, ids[0]))
            .unwrap();

        assert_eq!(*seen.lock(), vec!["pre:doomed", "post:doomed"]);
        let result = store.view::<Note, EngineError, _>(|tx| repo.get_by_id(tx, ids[0]));
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn failing_pre_delete_hook_aborts_the_transaction() {
        let (store, repo) = setup();
        let ids = seed(&store, &repo, &["protected"]);

        repo.service()
            .hooks()
            .on_pre_delete(Box::new(|_, _| Err(EngineError::invalid("kept"))));

        let result = store.update::<(), EngineError, _>(|tx| repo.delete(tx, ids[0]));
        assert!(result.is_err());

        // Rolled back: the record is still there.
        let note = store
            .view::<_, EngineError, _>(|tx| repo.get_by_id(tx, ids[0]))
            .unwrap();
        assert_eq!(note.body, "protected");
    }

    #[test]
    fn get_all_returns_ascending_id_order() {
        let (store, repo) = setup();
        seed(&store, &repo, &["a", "b", "c"]);

        let all = store
            .view::<_, EngineError, _>(|tx| repo.get_all(tx, None, None))
            .unwrap();
        let bodies: Vec<&str> = all.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b", "c"]);
    }

    #[test]
    fn pagination_windows() {
        let (store, repo) = setup();
        seed(&store, &repo, &["r1", "r2", "r3", "r4", "r5"]);

        let page = |first: Option<i64>, skip: Option<i64>| {
            store
                .view::<_, EngineError, _>(|tx| repo.get_all(tx, first, skip))
                .unwrap()
                .iter()
                .map(|n| n.body.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(page(Some(2), Some(1)), vec!["r2", "r3"]);
        assert_eq!(page(Some(-1), Some(2)), vec!["r3", "r4", "r5"]);
        assert_eq!(page(None, None).len(), 5);
        assert!(page(Some(0), None).is_empty());
        assert_eq!(page(Some(3), Some(-7)), vec!["r1", "r2", "r3"]);
        assert!(page(Some(10), Some(5)).is_empty());
    }

    #[test]
    fn get_filter_windows_after_predicate() {
        let (store, repo) = setup();
        seed(&store, &repo, &["keep1", "drop", "keep2", "drop", "keep3"]);

        let kept = store
            .view::<_, EngineError, _>(|tx| {
                repo.get_filter(tx, Some(2), Some(1), |n| n.body.starts_with("keep"))
            })
            .unwrap();
        let bodies: Vec<&str> = kept.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["keep2", "keep3"]);
    }

    #[test]
    fn get_multiple_preserves_caller_order_and_aborts_on_missing() {
        let (store, repo) = setup();
        let ids = seed(&store, &repo, &["a", "b", "c"]);

        let picked = store
            .view::<_, EngineError, _>(|tx| {
                repo.get_multiple(tx, &[ids[2], ids[0]], None, None, |_| true)
            })
            .unwrap();
        let bodies: Vec<&str> = picked.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["c", "a"]);

        let result = store.view::<Vec<Note>, EngineError, _>(|tx| {
            repo.get_multiple(tx, &[ids[0], EntityId::new(77)], None, None, |_| true)
        });
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn find_first_short_circuits() {
        let (store, repo) = setup();
        seed(&store, &repo, &["one", "two", "two"]);

        let found = store
            .view::<_, EngineError, _>(|tx| repo.find_first(tx, |n| n.body == "two"))
            .unwrap()
            .unwrap();
        assert_eq!(found.meta().id, EntityId::new(2));

        let missing = store
            .view::<_, EngineError, _>(|tx| repo.find_first(tx, |n| n.body == "absent"))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn window_normalization() {
        assert_eq!(window(None, None), (0, None));
        assert_eq!(window(Some(-3), Some(-3)), (0, None));
        assert_eq!(window(Some(0), Some(4)), (4, Some(0)));
        assert_eq!(window(Some(7), None), (0, Some(7)));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // For a bucket of K records, any (first, skip) pair must
            // return exactly the slice r[S..min(S+F, K)] of the
            // ascending-ID ordering.
            #[test]
            fn pagination_matches_slice_semantics(
                count in 0usize..10,
                first in proptest::option::of(-2i64..12),
                skip in proptest::option::of(-2i64..12),
            ) {
                let (store, repo) = setup();
                let bodies: Vec<String> = (0..count).map(|i| format!("r{i}")).collect();
                let refs: Vec<&str> = bodies.iter().map(String::as_str).collect();
                seed(&store, &repo, &refs);

                let got: Vec<String> = store
                    .view::<_, EngineError, _>(|tx| repo.get_all(tx, first, skip))
                    .unwrap()
                    .into_iter()
                    .map(|n| n.body)
                    .collect();

                let s = skip.map_or(0, |s| s.max(0) as usize).min(count);
                let e = match first {
                    Some(f) if f >= 0 => (s + f as usize).min(count),
                    _ => count,
                };
                prop_assert_eq!(got, bodies[s..e].to_vec());
            }
        }
    }
}
