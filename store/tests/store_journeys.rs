//! Store-driven journeys: containers feeding presentations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use journey_core::{
    conditionally, AnyPresentable, ContinueJourney, DismissJourney, Journey, Node, Produced,
    Window,
};
use journey_store::{Store, StoreContainer, StoreJourneyExt};

#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
struct SessionState {
    alerts: u32,
    logged_in: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
enum SessionAction {
    Alert,
    LogIn,
    LogOut,
}

struct SessionStore;

impl Store for SessionStore {
    const NAME: &'static str = "session";
    type State = SessionState;
    type Action = SessionAction;

    fn reduce(state: &SessionState, action: &SessionAction) -> SessionState {
        match action {
            SessionAction::Alert => SessionState {
                alerts: state.alerts + 1,
                ..state.clone()
            },
            SessionAction::LogIn => SessionState {
                logged_in: true,
                ..state.clone()
            },
            SessionAction::LogOut => SessionState::default(),
        }
    }
}

async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

fn screen(node: &Node) -> AnyPresentable<Node, ()> {
    let node = node.clone();
    AnyPresentable::new(move || Produced::Matter(node.clone(), ()))
}

fn leaf(title: &str) -> AnyPresentable<Node, ()> {
    let title = title.to_string();
    AnyPresentable::new(move || Produced::Matter(Node::new(title.clone()), ()))
}

#[tokio::test]
async fn actions_drive_nested_presentations() {
    let container = StoreContainer::in_memory();
    let window = Window::new();
    let node = Node::new("home");

    let journey = Journey::plain(screen(&node)).on_action::<SessionStore, _, _>(
        &container,
        |action| {
            conditionally(
                matches!(action, SessionAction::Alert),
                || Journey::plain(leaf("alert")),
                || ContinueJourney,
            )
        },
    );

    window.present(journey);
    settle().await;

    let store = container.get::<SessionStore>();
    store.send(SessionAction::LogIn);
    settle().await;
    assert_eq!(node.child_count(), 0);

    store.send(SessionAction::Alert);
    settle().await;
    assert_eq!(node.child_titles(), ["alert"]);
}

#[tokio::test]
async fn log_out_dismisses_the_enclosing_journey() {
    let container = StoreContainer::in_memory();
    let window = Window::new();
    let node = Node::new("home");

    let dismissed = Arc::new(AtomicUsize::new(0));
    let counter = dismissed.clone();

    let journey = Journey::plain(screen(&node))
        .on_action::<SessionStore, _, _>(&container, |action| {
            conditionally(
                matches!(action, SessionAction::LogOut),
                || DismissJourney,
                || ContinueJourney,
            )
        })
        .on_dismiss(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let bag = window.present(journey);
    settle().await;
    assert_eq!(window.root().child_count(), 1);

    container.get::<SessionStore>().send(SessionAction::LogOut);
    settle().await;

    assert_eq!(dismissed.load(Ordering::SeqCst), 1);
    assert_eq!(window.root().child_count(), 0);
    assert!(bag.is_disposed());
}

#[tokio::test]
async fn state_changes_drive_nested_presentations() {
    let container = StoreContainer::in_memory();
    let window = Window::new();
    let node = Node::new("home");

    let journey = Journey::plain(screen(&node)).on_state::<SessionStore, _, _>(
        &container,
        |state| {
            conditionally(
                state.alerts >= 2,
                || Journey::plain(leaf("alert-banner")),
                || ContinueJourney,
            )
        },
    );

    window.present(journey);
    settle().await;

    let store = container.get::<SessionStore>();
    store.send(SessionAction::Alert);
    settle().await;
    assert_eq!(node.child_count(), 0);

    store.send(SessionAction::Alert);
    settle().await;
    assert_eq!(node.child_titles(), ["alert-banner"]);
}

#[tokio::test]
async fn disposed_journey_stops_observing_the_store() {
    let container = StoreContainer::in_memory();
    let window = Window::new();
    let node = Node::new("home");

    let journey = Journey::plain(screen(&node)).on_action::<SessionStore, _, _>(
        &container,
        |_| Journey::plain(leaf("alert")),
    );

    let bag = window.present(journey);
    settle().await;

    bag.dispose();
    container.get::<SessionStore>().send(SessionAction::Alert);
    settle().await;

    assert_eq!(node.child_count(), 0);
}
