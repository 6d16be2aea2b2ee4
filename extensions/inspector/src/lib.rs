//! The store inspector: an HTTP/WebSocket bridge onto a running container.
//!
//! Attach an [`Inspector`] to a container via
//! [`StoreContainer::with_debugger`](journey_store::StoreContainer::with_debugger)
//! and serve it; external tooling can then list stores with their action
//! schemas, follow state over a WebSocket and inject actions.
//!
//! Routes:
//! - `GET /stores` - every registered store and the JSON Schema of its actions
//! - `GET /state` - WebSocket; a snapshot of all stores on connect, then one
//!   message per state change
//! - `POST /send` - `{ "store": name, "action": json }` decodes and dispatches

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

use journey_core::Bag;
use journey_store::{DebugHandle, InjectError, StoreDebugger};

type StateFn = Box<dyn Fn() -> Value + Send + Sync>;
type InjectFn = Box<dyn Fn(Value) -> Result<(), InjectError> + Send + Sync>;

struct RegisteredStore {
    name: &'static str,
    actions_schema: Value,
    state: StateFn,
    inject: InjectFn,
}

struct InspectorInner {
    stores: Mutex<Vec<RegisteredStore>>,
    events: broadcast::Sender<String>,
    bag: Bag,
}

/// The debug bridge. Clone freely; clones share one registry and event
/// channel.
#[derive(Clone)]
pub struct Inspector {
    inner: Arc<InspectorInner>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct StoreIndex {
    stores: Vec<StoreSummary>,
}

#[derive(Serialize)]
struct StoreSummary {
    name: &'static str,
    actions: Value,
}

#[derive(Serialize)]
struct StateSnapshot {
    store: &'static str,
    state: Value,
}

#[derive(Deserialize)]
struct SendRequest {
    store: String,
    action: Value,
}

impl Inspector {
    pub fn new() -> Self {
        let (events, _rx) = broadcast::channel(100);
        Self {
            inner: Arc::new(InspectorInner {
                stores: Mutex::new(Vec::new()),
                events,
                bag: Bag::new(),
            }),
        }
    }

    /// Serves the bridge until the process exits.
    pub async fn serve(self, port: u16) -> Result<(), std::io::Error> {
        let app = Router::new()
            .route("/stores", get(get_stores))
            .route("/state", get(ws_handler))
            .route("/send", post(post_send))
            .layer(CorsLayer::permissive())
            .with_state(self.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tracing::info!("Journey Inspector listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await
    }

    fn snapshot_all(&self) -> Vec<String> {
        self.inner
            .stores
            .lock()
            .iter()
            .filter_map(|store| {
                serde_json::to_string(&StateSnapshot {
                    store: store.name,
                    state: (store.state)(),
                })
                .ok()
            })
            .collect()
    }

    fn index(&self) -> StoreIndex {
        StoreIndex {
            stores: self
                .inner
                .stores
                .lock()
                .iter()
                .map(|store| StoreSummary {
                    name: store.name,
                    actions: store.actions_schema.clone(),
                })
                .collect(),
        }
    }

    fn inject(&self, request: SendRequest) -> Result<(), InjectError> {
        let stores = self.inner.stores.lock();
        let store = stores
            .iter()
            .find(|store| store.name == request.store)
            .ok_or(InjectError::UnknownStore(request.store))?;
        (store.inject)(request.action)
    }
}

impl StoreDebugger for Inspector {
    fn register_store(&self, handle: DebugHandle) {
        let DebugHandle {
            name,
            actions_schema,
            state,
            subscribe,
            inject,
        } = handle;

        let events = self.inner.events.clone();
        let subscription = subscribe(Box::new(move |state| {
            if let Ok(text) = serde_json::to_string(&StateSnapshot { store: name, state }) {
                let _ = events.send(text);
            }
        }));
        self.inner.bag.add_disposable(subscription);

        let schema = serde_json::to_value(&actions_schema).unwrap_or(Value::Null);
        self.inner.stores.lock().push(RegisteredStore {
            name,
            actions_schema: schema,
            state,
            inject,
        });
        tracing::debug!(store = name, "registered with inspector");
    }
}

async fn get_stores(State(inspector): State<Inspector>) -> Json<StoreIndex> {
    Json(inspector.index())
}

async fn ws_handler(ws: WebSocketUpgrade, State(inspector): State<Inspector>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, inspector))
}

async fn handle_socket(mut socket: WebSocket, inspector: Inspector) {
    // Subscribe before snapshotting so updates racing the snapshot are not
    // lost, then replay current state for every store.
    let mut rx = inspector.inner.events.subscribe();

    for snapshot in inspector.snapshot_all() {
        if socket.send(Message::Text(snapshot)).await.is_err() {
            return;
        }
    }

    while let Ok(msg) = rx.recv().await {
        if socket.send(Message::Text(msg)).await.is_err() {
            break;
        }
    }
}

async fn post_send(
    State(inspector): State<Inspector>,
    Json(request): Json<SendRequest>,
) -> impl IntoResponse {
    match inspector.inject(request) {
        Ok(()) => (StatusCode::OK, "ok".to_string()),
        Err(error @ InjectError::UnknownStore(_)) => {
            (StatusCode::NOT_FOUND, error.to_string())
        }
        Err(error) => (StatusCode::BAD_REQUEST, error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde_json::json;

    use journey_store::{StateStore, Store};

    #[derive(Clone, Default, Serialize, Deserialize)]
    struct PingState {
        pings: u32,
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
    enum PingAction {
        Ping,
    }

    struct PingStore;

    impl Store for PingStore {
        const NAME: &'static str = "ping";
        type State = PingState;
        type Action = PingAction;

        fn reduce(state: &PingState, action: &PingAction) -> PingState {
            match action {
                PingAction::Ping => PingState {
                    pings: state.pings + 1,
                },
            }
        }
    }

    #[tokio::test]
    async fn registry_indexes_snapshots_and_injects() {
        let inspector = Inspector::new();
        let store = StateStore::<PingStore>::in_memory();
        inspector.register_store(DebugHandle::for_store(&store));

        let index = inspector.index();
        assert_eq!(index.stores.len(), 1);
        assert_eq!(index.stores[0].name, "ping");
        assert!(index.stores[0].actions.is_object());

        let mut rx = inspector.inner.events.subscribe();

        inspector
            .inject(SendRequest {
                store: "ping".to_string(),
                action: json!("Ping"),
            })
            .expect("inject");
        assert_eq!(store.state().pings, 1);

        let update = rx.try_recv().expect("state update broadcast");
        let value: Value = serde_json::from_str(&update).expect("valid json");
        assert_eq!(value, json!({ "store": "ping", "state": { "pings": 1 } }));

        let snapshots = inspector.snapshot_all();
        assert_eq!(snapshots.len(), 1);

        let missing = inspector
            .inject(SendRequest {
                store: "nope".to_string(),
                action: json!("Ping"),
            })
            .expect_err("unknown store");
        assert!(matches!(missing, InjectError::UnknownStore(_)));
    }
}
