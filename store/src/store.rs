//! Stores and the dispatch transaction.
//!
//! A [`Store`] is pure description: a name, a state type, an action type, a
//! reducer and optional effects. [`StateStore`] is the running instance that
//! owns the single writer seat. `send` is the only way state changes, and it
//! is one synchronous transaction: reduce, commit, broadcast, schedule
//! persistence, spawn effects.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::AbortHandle;
use uuid::Uuid;

use journey_core::bag::Disposable;
use journey_core::signal::{Callbacker, ReadSignal, StateSignal};

use crate::effect::Effect;
use crate::persistence;

/// Identity of a running effect.
pub type EffectId = Uuid;

/// The pure description of a store.
///
/// `reduce` must be total and side-effect-free; anything asynchronous
/// belongs in `effects`. Stores without side effects leave `effects` at its
/// default.
pub trait Store: Send + Sync + 'static {
    /// Stable name, used for persistence files and the debug bridge.
    const NAME: &'static str;

    type State: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Action: Clone
        + PartialEq
        + Debug
        + Serialize
        + DeserializeOwned
        + JsonSchema
        + Send
        + Sync
        + 'static;

    fn reduce(state: &Self::State, action: &Self::Action) -> Self::State;

    fn effects(
        get_state: &dyn Fn() -> Self::State,
        action: &Self::Action,
    ) -> Option<Effect<Self::Action>> {
        let _ = (get_state, action);
        None
    }
}

struct RunningEffect<A> {
    action: A,
    abort: AbortHandle,
}

/// A running store instance. All mutation goes through [`send`](StateStore::send).
pub struct StateStore<S: Store> {
    state: StateSignal<S::State>,
    actions: Callbacker<S::Action>,
    effects: Mutex<HashMap<EffectId, RunningEffect<S::Action>>>,
    persist_path: Option<PathBuf>,
}

impl<S: Store> StateStore<S> {
    pub(crate) fn create(initial: S::State, persist_path: Option<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            state: StateSignal::new(initial),
            actions: Callbacker::new(),
            effects: Mutex::new(HashMap::new()),
            persist_path,
        })
    }

    /// A standalone in-memory store, outside any container.
    pub fn in_memory() -> Arc<Self> {
        Self::create(S::State::default(), None)
    }

    pub fn state(&self) -> S::State {
        self.state.value()
    }

    /// The state signal: current value plus synchronous change notifications.
    pub fn state_signal(&self) -> ReadSignal<S::State> {
        self.state.read_only()
    }

    /// Subscribes to every dispatched action, observed after the state it
    /// produced has committed.
    pub fn subscribe_actions(
        &self,
        callback: impl Fn(&S::Action) + Send + Sync + 'static,
    ) -> Disposable {
        self.actions.subscribe(callback)
    }

    pub fn subscribe_states(
        &self,
        callback: impl Fn(&S::State) + Send + Sync + 'static,
    ) -> Disposable {
        self.state.subscribe(callback)
    }

    /// Dispatches an action: reduce, commit, notify state subscribers, then
    /// action subscribers, then schedule persistence and effects.
    pub fn send(self: &Arc<Self>, action: S::Action) {
        tracing::debug!(store = S::NAME, action = ?action, "send");

        let next = S::reduce(&self.state.value(), &action);
        self.state.set(next);
        self.actions.call_all(&action);
        self.schedule_persist();

        let state = self.state.clone();
        let get_state = move || state.value();
        if let Some(effect) = S::effects(&get_state, &action) {
            self.spawn_effect(action, effect);
        }
    }

    fn spawn_effect(self: &Arc<Self>, action: S::Action, effect: Effect<S::Action>) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(store = S::NAME, "no runtime available; effect dropped");
                return;
            }
        };

        let id = Uuid::new_v4();
        let weak = Arc::downgrade(self);
        let mut stream = effect.into_stream();

        // Hold the lock across the spawn: a fast effect's self-removal must
        // not run before its entry exists.
        let mut effects = self.effects.lock();
        let task = runtime.spawn(async move {
            while let Some(next) = stream.next().await {
                let Some(store) = weak.upgrade() else { break };
                store.send(next);
            }
            if let Some(store) = weak.upgrade() {
                store.effects.lock().remove(&id);
            }
        });
        effects.insert(
            id,
            RunningEffect {
                action,
                abort: task.abort_handle(),
            },
        );
    }

    /// Cancels every running effect whose originating action equals `action`.
    pub fn cancel_effect(&self, action: &S::Action) {
        self.effects.lock().retain(|id, running| {
            if running.action == *action {
                tracing::debug!(store = S::NAME, effect = %id, "cancelling effect");
                running.abort.abort();
                false
            } else {
                true
            }
        });
    }

    /// Cancels one effect by its id.
    pub fn cancel_effect_by_id(&self, id: EffectId) {
        if let Some(running) = self.effects.lock().remove(&id) {
            tracing::debug!(store = S::NAME, effect = %id, "cancelling effect");
            running.abort.abort();
        }
    }

    /// Ids of effects still running.
    pub fn pending_effects(&self) -> Vec<EffectId> {
        self.effects.lock().keys().copied().collect()
    }

    /// Forwards every action of this store into another, mapped through `f`
    /// together with the already-committed state.
    pub fn pipe_to<T: Store>(
        self: &Arc<Self>,
        other: &Arc<StateStore<T>>,
        f: impl Fn(&S::Action, &S::State) -> Option<T::Action> + Send + Sync + 'static,
    ) -> Disposable {
        let state = self.state.clone();
        let other = other.clone();
        self.actions.subscribe(move |action| {
            if let Some(mapped) = f(action, &state.value()) {
                other.send(mapped);
            }
        })
    }

    fn schedule_persist(&self) {
        let Some(path) = self.persist_path.clone() else {
            return;
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(store = S::NAME, "no runtime available; skipping persistence");
                return;
            }
        };
        let snapshot = self.state.value();
        runtime.spawn_blocking(move || {
            if let Err(error) = persistence::write(&path, &snapshot) {
                tracing::warn!(store = S::NAME, %error, "could not persist state");
            }
        });
    }
}
