//! Lifecycle hook registry.

use crate::error::EngineResult;
use mediadb_storage::Tx;
use parking_lot::RwLock;

/// A lifecycle callback.
///
/// Hooks receive the transaction the triggering operation runs in and
/// the record being written or deleted; an error aborts the whole
/// transaction.
pub type Hook<M> = Box<dyn Fn(&Tx<'_>, &M) -> EngineResult<()> + Send + Sync>;

/// Ordered lifecycle callbacks owned by one service.
///
/// Each list fires synchronously, in registration order, inside the
/// caller's transaction. Dependent relationship services append their
/// cascading-delete callbacks here at construction time — registration
/// happens once, after all services exist and before any delete runs,
/// which is why service construction is ordered leaf-first.
pub struct PersistHooks<M> {
    pre_create: RwLock<Vec<Hook<M>>>,
    post_create: RwLock<Vec<Hook<M>>>,
    pre_update: RwLock<Vec<Hook<M>>>,
    post_update: RwLock<Vec<Hook<M>>>,
    pre_delete: RwLock<Vec<Hook<M>>>,
    post_delete: RwLock<Vec<Hook<M>>>,
}

impl<M> PersistHooks<M> {
    /// Creates an empty hook registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pre_create: RwLock::new(Vec::new()),
            post_create: RwLock::new(Vec::new()),
            pre_update: RwLock::new(Vec::new()),
            post_update: RwLock::new(Vec::new()),
            pre_delete: RwLock::new(Vec::new()),
            post_delete: RwLock::new(Vec::new()),
        }
    }

    /// Appends a pre-create hook.
    pub fn on_pre_create(&self, hook: Hook<M>) {
        self.pre_create.write().push(hook);
    }

    /// Appends a post-create hook.
    pub fn on_post_create(&self, hook: Hook<M>) {
        self.post_create.write().push(hook);
    }

    /// Appends a pre-update hook.
    pub fn on_pre_update(&self, hook: Hook<M>) {
        self.pre_update.write().push(hook);
    }

    /// Appends a post-update hook.
    pub fn on_post_update(&self, hook: Hook<M>) {
        self.post_update.write().push(hook);
    }

    /// Appends a pre-delete hook. This is the cascade mechanism.
    pub fn on_pre_delete(&self, hook: Hook<M>) {
        self.pre_delete.write().push(hook);
    }

    /// Appends a post-delete hook.
    pub fn on_post_delete(&self, hook: Hook<M>) {
        self.post_delete.write().push(hook);
    }

    /// Runs the pre-create hooks in registration order.
    pub fn run_pre_create(&self, tx: &Tx<'_>, model: &M) -> EngineResult<()> {
        run(&self.pre_create, tx, model)
    }

    /// Runs the post-create hooks in registration order.
    pub fn run_post_create(&self, tx: &Tx<'_>, model: &M) -> EngineResult<()> {
        run(&self.post_create, tx, model)
    }

    /// Runs the pre-update hooks in registration order.
    pub fn run_pre_update(&self, tx: &Tx<'_>, model: &M) -> EngineResult<()> {
        run(&self.pre_update, tx, model)
    }

    /// Runs the post-update hooks in registration order.
    pub fn run_post_update(&self, tx: &Tx<'_>, model: &M) -> EngineResult<()> {
        run(&self.post_update, tx, model)
    }

    /// Runs the pre-delete hooks in registration order.
    pub fn run_pre_delete(&self, tx: &Tx<'_>, model: &M) -> EngineResult<()> {
        run(&self.pre_delete, tx, model)
    }

    /// Runs the post-delete hooks in registration order.
    pub fn run_post_delete(&self, tx: &Tx<'_>, model: &M) -> EngineResult<()> {
        run(&self.post_delete, tx, model)
    }
}

impl<M> Default for PersistHooks<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> std::fmt::Debug for PersistHooks<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistHooks")
            .field("pre_create", &self.pre_create.read().len())
            .field("post_create", &self.post_create.read().len())
            .field("pre_update", &self.pre_update.read().len())
            .field("post_update", &self.post_update.read().len())
            .field("pre_delete", &self.pre_delete.read().len())
            .field("post_delete", &self.post_delete.read().len())
            .finish()
    }
}

fn run<M>(hooks: &RwLock<Vec<Hook<M>>>, tx: &Tx<'_>, model: &M) -> EngineResult<()> {
    for hook in hooks.read().iter() {
        hook(tx, model)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use mediadb_storage::{Store, StoreOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn store() -> Store {
        Store::open_in_memory(StoreOptions::new()).unwrap()
    }

    #[test]
    fn hooks_fire_in_registration_order() {
        let hooks: PersistHooks<u32> = PersistHooks::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            hooks.on_pre_delete(Box::new(move |_, _| {
                order.lock().push(tag);
                Ok(())
            }));
        }

        store()
            .view::<_, EngineError, _>(|tx| hooks.run_pre_delete(tx, &7))
            .unwrap();

        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn failing_hook_stops_the_chain() {
        let hooks: PersistHooks<u32> = PersistHooks::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        hooks.on_pre_create(Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::invalid("boom"))
        }));
        let counter = Arc::clone(&calls);
        hooks.on_pre_create(Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let result = store().view::<_, EngineError, _>(|tx| hooks.run_pre_create(tx, &7));
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let hooks: PersistHooks<u32> = PersistHooks::new();
        store()
            .view::<_, EngineError, _>(|tx| {
                hooks.run_pre_update(tx, &1)?;
                hooks.run_post_update(tx, &1)?;
                hooks.run_post_delete(tx, &1)
            })
            .unwrap();
    }
}
