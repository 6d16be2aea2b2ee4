//! Store dependency injection.
//!
//! A [`StoreContainer`] owns at most one [`StateStore`] per store type and
//! hands out shared handles on demand. Callers thread a container handle to
//! whatever needs store access; there is no process-wide instance.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::debugger::{DebugHandle, StoreDebugger};
use crate::persistence;
use crate::store::{StateStore, Store};

/// Memoizing factory for stores.
pub struct StoreContainer {
    stores: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    persistence_dir: Option<PathBuf>,
    debugger: Option<Arc<dyn StoreDebugger>>,
}

impl StoreContainer {
    fn build(
        persistence_dir: Option<PathBuf>,
        debugger: Option<Arc<dyn StoreDebugger>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            stores: Mutex::new(HashMap::new()),
            persistence_dir,
            debugger,
        })
    }

    /// A container whose stores live and die with the process.
    pub fn in_memory() -> Arc<Self> {
        Self::build(None, None)
    }

    /// A container that restores each store from `dir` on first access and
    /// persists every state change back to it.
    pub fn persisting(dir: impl Into<PathBuf>) -> Arc<Self> {
        Self::build(Some(dir.into()), None)
    }

    /// Attaches a debugger; every store initialized afterwards is registered
    /// with it.
    pub fn with_debugger(
        persistence_dir: Option<PathBuf>,
        debugger: Arc<dyn StoreDebugger>,
    ) -> Arc<Self> {
        Self::build(persistence_dir, Some(debugger))
    }

    /// The store for `S`, created on first access and memoized after.
    ///
    /// Creation restores persisted state when the container has a
    /// persistence directory, falling back to `S::State::default()`.
    pub fn get<S: Store>(&self) -> Arc<StateStore<S>> {
        let created = {
            let mut stores = self.stores.lock();
            if let Some(existing) = stores.get(&TypeId::of::<S>()) {
                if let Ok(store) = existing.clone().downcast::<StateStore<S>>() {
                    return store;
                }
            }

            let path = self
                .persistence_dir
                .as_deref()
                .map(|dir| persistence::store_path(dir, S::NAME));
            let initial = path
                .as_deref()
                .and_then(persistence::restore::<S::State>)
                .unwrap_or_default();
            let store = StateStore::<S>::create(initial, path);
            stores.insert(TypeId::of::<S>(), store.clone());
            store
        };

        tracing::debug!(store = S::NAME, "store initialized");
        if let Some(debugger) = &self.debugger {
            debugger.register_store(DebugHandle::for_store(&created));
        }
        created
    }

    /// Drops the store for `S` and removes its persisted state. The next
    /// [`get`](StoreContainer::get) starts from defaults.
    pub fn destroy<S: Store>(&self) {
        self.stores.lock().remove(&TypeId::of::<S>());
        if let Some(dir) = self.persistence_dir.as_deref() {
            persistence::destroy(&persistence::store_path(dir, S::NAME));
        }
        tracing::debug!(store = S::NAME, "store destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
    struct CounterState {
        count: i64,
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
    enum CounterAction {
        Increment,
    }

    struct CounterStore;

    impl Store for CounterStore {
        const NAME: &'static str = "counter";
        type State = CounterState;
        type Action = CounterAction;

        fn reduce(state: &CounterState, action: &CounterAction) -> CounterState {
            match action {
                CounterAction::Increment => CounterState {
                    count: state.count + 1,
                },
            }
        }
    }

    #[tokio::test]
    async fn get_memoizes_per_store_type() {
        let container = StoreContainer::in_memory();
        let first = container.get::<CounterStore>();
        let second = container.get::<CounterStore>();

        first.send(CounterAction::Increment);
        assert_eq!(second.state().count, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn persisted_state_survives_container_restart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = persistence::store_path(dir.path(), CounterStore::NAME);

        {
            let container = StoreContainer::persisting(dir.path());
            let store = container.get::<CounterStore>();
            store.send(CounterAction::Increment);
            store.send(CounterAction::Increment);

            // Persistence runs off the sending context; wait for the file.
            for _ in 0..100 {
                if persistence::restore::<CounterState>(&path)
                    .is_some_and(|state| state.count == 2)
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }

        let container = StoreContainer::persisting(dir.path());
        let store = container.get::<CounterStore>();
        assert_eq!(store.state().count, 2);
    }

    #[tokio::test]
    async fn destroy_resets_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = StoreContainer::persisting(dir.path());

        let store = container.get::<CounterStore>();
        store.send(CounterAction::Increment);

        container.destroy::<CounterStore>();
        let fresh = container.get::<CounterStore>();
        assert_eq!(fresh.state().count, 0);
        assert!(!Arc::ptr_eq(&store, &fresh));
    }

    struct RecordingDebugger {
        names: PlMutex<Vec<&'static str>>,
    }

    impl StoreDebugger for RecordingDebugger {
        fn register_store(&self, handle: DebugHandle) {
            self.names.lock().push(handle.name);
        }
    }

    #[tokio::test]
    async fn debugger_sees_each_store_once() {
        let debugger = Arc::new(RecordingDebugger {
            names: PlMutex::new(Vec::new()),
        });
        let container = StoreContainer::with_debugger(None, debugger.clone());

        container.get::<CounterStore>();
        container.get::<CounterStore>();

        assert_eq!(&*debugger.names.lock(), &["counter"]);
    }
}
