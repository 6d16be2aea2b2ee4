//! The debugger seam.
//!
//! A container can carry one [`StoreDebugger`]. Every store the container
//! initializes is handed over as a type-erased [`DebugHandle`]: enough to
//! read state as JSON, follow updates, describe the action vocabulary as a
//! schema and inject actions decoded from JSON. The debugger never sees the
//! concrete store types.

use std::sync::Arc;

use schemars::schema::RootSchema;
use serde_json::Value;
use thiserror::Error;

use journey_core::bag::Disposable;

use crate::store::{StateStore, Store};

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("unknown store {0}")]
    UnknownStore(String),

    #[error("could not decode action: {0}")]
    Decode(#[from] serde_json::Error),
}

type StateFn = Box<dyn Fn() -> Value + Send + Sync>;
type StateCallback = Box<dyn Fn(Value) + Send + Sync>;
type SubscribeFn = Box<dyn Fn(StateCallback) -> Disposable + Send + Sync>;
type InjectFn = Box<dyn Fn(Value) -> Result<(), InjectError> + Send + Sync>;

/// A type-erased view of one running store.
pub struct DebugHandle {
    pub name: &'static str,
    /// JSON Schema describing the store's action type.
    pub actions_schema: RootSchema,
    pub state: StateFn,
    pub subscribe: SubscribeFn,
    pub inject: InjectFn,
}

impl DebugHandle {
    pub fn for_store<S: Store>(store: &Arc<StateStore<S>>) -> Self {
        let schema = schemars::gen::SchemaGenerator::default().into_root_schema_for::<S::Action>();

        let reading = store.clone();
        let state: StateFn =
            Box::new(move || serde_json::to_value(reading.state()).unwrap_or(Value::Null));

        let watching = store.clone();
        let subscribe: SubscribeFn = Box::new(move |callback: StateCallback| {
            watching.state_signal().subscribe(move |state| {
                callback(serde_json::to_value(state).unwrap_or(Value::Null));
            })
        });

        let injecting = store.clone();
        let inject: InjectFn = Box::new(move |value| {
            let action: S::Action = serde_json::from_value(value)?;
            injecting.send(action);
            Ok(())
        });

        DebugHandle {
            name: S::NAME,
            actions_schema: schema,
            state,
            subscribe,
            inject,
        }
    }
}

/// Receives every store a container initializes.
pub trait StoreDebugger: Send + Sync {
    fn register_store(&self, handle: DebugHandle);
}
