//! A headless messages flow.
//!
//! A list screen emits events; composing presents a modal whose future result
//! lands in the messages store, and closing dismisses the whole flow. Run with
//! `JOURNEY_INSPECTOR_PORT=8123` to expose the store over the debug bridge,
//! and run twice to watch persisted messages survive a restart.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use journey_core::{
    conditionally, AnyJourney, AnyPresentable, DismissJourney, FutureResult, Journey,
    JourneyPresentation, Matter, Node, PresentationStyle, Produced, Signal, Window,
};
use journey_inspector::Inspector;
use journey_store::{Store, StoreContainer};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
struct Message {
    title: String,
    body: String,
}

#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
struct MessagesState {
    messages: Vec<Message>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
enum MessagesAction {
    Send(Message),
    Clear,
}

struct MessagesStore;

impl Store for MessagesStore {
    const NAME: &'static str = "messages";
    type State = MessagesState;
    type Action = MessagesAction;

    fn reduce(state: &MessagesState, action: &MessagesAction) -> MessagesState {
        match action {
            MessagesAction::Send(message) => {
                let mut messages = state.messages.clone();
                messages.push(message.clone());
                MessagesState { messages }
            }
            MessagesAction::Clear => MessagesState::default(),
        }
    }
}

#[derive(Clone, Debug)]
enum ListEvent {
    Compose,
    Close,
}

/// The message list. Emits one event per user interaction.
#[derive(Clone)]
struct ListScreen {
    node: Node,
    events: Signal<ListEvent>,
}

impl ListScreen {
    fn new() -> Self {
        Self {
            node: Node::new("messages"),
            events: Signal::new(),
        }
    }
}

impl Matter for ListScreen {
    fn node(&self) -> &Node {
        &self.node
    }
}

/// The compose prompt. Resolves to the drafted message.
#[derive(Clone)]
struct ComposeScreen {
    node: Node,
    draft: FutureResult<Message>,
}

impl ComposeScreen {
    fn new() -> Self {
        Self {
            node: Node::new("compose"),
            draft: FutureResult::new(),
        }
    }
}

impl Matter for ComposeScreen {
    fn node(&self) -> &Node {
        &self.node
    }
}

fn messages_flow(
    list: &ListScreen,
    compose: &ComposeScreen,
    container: &Arc<StoreContainer>,
) -> AnyJourney<ListScreen, Signal<ListEvent>> {
    let presentable = {
        let list = list.clone();
        AnyPresentable::new(move || Produced::Matter(list.clone(), list.events.clone()))
    };

    let compose = compose.clone();
    let container = container.clone();
    Journey::new(presentable, move |event| {
        let compose = compose.clone();
        let container = container.clone();
        conditionally(
            matches!(event, ListEvent::Compose),
            move || {
                let screen = compose.clone();
                let presentable = AnyPresentable::new(move || {
                    Produced::Matter(screen.clone(), screen.draft.clone())
                });
                Journey::future(presentable)
                    .with_style(PresentationStyle::Modal)
                    .on_future_value(move |message: Message| {
                        container
                            .get::<MessagesStore>()
                            .send(MessagesAction::Send(message));
                    })
            },
            || DismissJourney,
        )
    })
    .on_present(|| tracing::info!("messages flow presented"))
    .on_dismiss(|| tracing::info!("messages flow dismissed"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let state_dir = std::env::temp_dir().join("journey-messages-demo");
    let inspector = Inspector::new();
    let container = StoreContainer::with_debugger(
        Some(state_dir.clone()),
        Arc::new(inspector.clone()),
    );

    if let Ok(port) = std::env::var("JOURNEY_INSPECTOR_PORT") {
        let port: u16 = port.parse()?;
        let bridge = inspector.clone();
        tokio::spawn(async move {
            if let Err(error) = bridge.serve(port).await {
                tracing::error!(%error, "inspector stopped");
            }
        });
    }

    let store = container.get::<MessagesStore>();
    tracing::info!(
        restored = store.state().messages.len(),
        dir = %state_dir.display(),
        "store ready"
    );

    let window = Window::new();
    let list = ListScreen::new();
    let compose = ComposeScreen::new();

    window.present(messages_flow(&list, &compose, &container));
    tokio::time::sleep(Duration::from_millis(50)).await;
    tracing::info!(tree = ?window.root().child_titles(), "after launch");

    // Compose a message: the modal presents, its future resolves into the
    // store, and the modal dismisses itself.
    list.events.send(ListEvent::Compose);
    tokio::time::sleep(Duration::from_millis(50)).await;
    tracing::info!(tree = ?list.node.child_titles(), "compose presented");

    compose.draft.succeed(Message {
        title: "hello".into(),
        body: "written from the compose modal".into(),
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    tracing::info!(
        messages = store.state().messages.len(),
        tree = ?list.node.child_titles(),
        "message sent"
    );

    // Close the list: the dismissal unwinds the whole flow.
    list.events.send(ListEvent::Close);
    tokio::time::sleep(Duration::from_millis(50)).await;
    tracing::info!(tree = ?window.root().child_titles(), "after close");

    // Give the fire-and-forget persistence a moment before exiting.
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
