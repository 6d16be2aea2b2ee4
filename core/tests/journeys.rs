//! End-to-end journey flows against an in-memory presentation tree.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use journey_core::{
    conditionally, AnyPresentable, ContinueJourney, DismissJourney, FutureResult, Journey,
    JourneyError, JourneyPresentResult, JourneyPresentation, Node, PresentationOptions, Produced,
    Signal, Window,
};

/// Lets spawned continuation tasks run to quiescence on the current-thread
/// test runtime.
async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

fn screen(node: &Node, signal: &Signal<i32>) -> AnyPresentable<Node, Signal<i32>> {
    let node = node.clone();
    let signal = signal.clone();
    AnyPresentable::new(move || Produced::Matter(node.clone(), signal.clone()))
}

fn leaf(title: &str) -> AnyPresentable<Node, ()> {
    let title = title.to_string();
    AnyPresentable::new(move || Produced::Matter(Node::new(title.clone()), ()))
}

#[tokio::test]
async fn finite_signal_continues_then_dismisses() {
    let window = Window::new();
    let node = Node::new("picker");
    let signal = Signal::new();

    let dismissed = Arc::new(AtomicUsize::new(0));
    let errors: Arc<Mutex<Vec<JourneyError>>> = Arc::new(Mutex::new(Vec::new()));

    let counter = dismissed.clone();
    let sink = errors.clone();
    let journey = Journey::new(screen(&node, &signal), |value| {
        conditionally(value == 2, || DismissJourney, || ContinueJourney)
    })
    .on_dismiss(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .on_error(move |error| {
        sink.lock().push(error.clone());
    });

    let bag = window.present(journey);
    settle().await;
    assert_eq!(window.root().child_titles(), ["picker"]);

    // Continue leaves the stack untouched: nothing nested is presented.
    signal.send(1);
    settle().await;
    assert_eq!(node.child_count(), 0);
    assert_eq!(dismissed.load(Ordering::SeqCst), 0);

    // Dismiss unwinds the journey, with auto-pop enabled by default.
    signal.send(2);
    settle().await;
    assert_eq!(dismissed.load(Ordering::SeqCst), 1);
    assert_eq!(window.root().child_count(), 0);
    assert!(bag.is_disposed());

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_dismissed());
}

#[tokio::test]
async fn dismissal_does_not_propagate_without_auto_pop() {
    let window = Window::new();
    let node = Node::new("picker");
    let signal = Signal::new();

    let dismissed = Arc::new(AtomicUsize::new(0));
    let counter = dismissed.clone();

    let journey = Journey::styled(
        screen(&node, &signal),
        Default::default(),
        PresentationOptions::DEFAULTS,
        |_| DismissJourney.with_options(PresentationOptions::DEFAULTS),
    )
    .on_dismiss(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let bag = window.present(journey);
    settle().await;

    signal.send(1);
    settle().await;

    assert_eq!(dismissed.load(Ordering::SeqCst), 0);
    assert_eq!(window.root().child_count(), 1);
    assert!(!bag.is_disposed());
}

#[tokio::test]
async fn dismissal_propagates_with_auto_pop() {
    let window = Window::new();
    let node = Node::new("picker");
    let signal = Signal::new();

    let dismissed = Arc::new(AtomicUsize::new(0));
    let counter = dismissed.clone();

    let journey = Journey::new(screen(&node, &signal), |_| DismissJourney).on_dismiss(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let bag = window.present(journey);
    settle().await;

    signal.send(1);
    settle().await;

    assert_eq!(dismissed.load(Ordering::SeqCst), 1);
    assert_eq!(window.root().child_count(), 0);
    assert!(bag.is_disposed());
}

#[tokio::test]
async fn nested_dismissal_cascades_through_auto_pop() {
    let window = Window::new();
    let root_node = Node::new("root");
    let root_signal = Signal::new();
    let child_node = Node::new("child");
    let child_signal = Signal::new();

    let errors: Arc<Mutex<Vec<JourneyError>>> = Arc::new(Mutex::new(Vec::new()));

    let child_screen = screen(&child_node, &child_signal);
    let sink = errors.clone();
    let journey = Journey::new(screen(&root_node, &root_signal), move |_| {
        Journey::new(child_screen.clone(), |_| DismissJourney)
    })
    .on_error(move |error| {
        sink.lock().push(error.clone());
    });

    window.present(journey);
    settle().await;

    root_signal.send(0);
    settle().await;
    assert_eq!(root_node.child_titles(), ["child"]);

    // The innermost dismissal unwinds every level that carries auto-pop.
    child_signal.send(0);
    settle().await;
    assert_eq!(root_node.child_count(), 0);
    assert_eq!(window.root().child_count(), 0);

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_dismissed());
}

#[tokio::test]
async fn new_value_replaces_previous_child() {
    let window = Window::new();
    let node = Node::new("list");
    let signal = Signal::new();

    let child_errors: Arc<Mutex<Vec<JourneyError>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = child_errors.clone();
    let journey = Journey::new(screen(&node, &signal), move |value: i32| {
        let sink = sink.clone();
        Journey::plain(leaf(&format!("detail-{value}"))).on_error(move |error| {
            sink.lock().push(error.clone());
        })
    });

    window.present(journey);
    settle().await;

    signal.send(1);
    settle().await;
    assert_eq!(node.child_titles(), ["detail-1"]);

    signal.send(2);
    settle().await;
    assert_eq!(node.child_titles(), ["detail-2"]);

    let errors = child_errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_cancelled());
}

#[tokio::test]
async fn signal_end_disposes_the_presentation() {
    let window = Window::new();
    let node = Node::new("wizard");
    let signal = Signal::new();

    let journey = Journey::new(screen(&node, &signal), |value: i32| {
        Journey::plain(leaf(&format!("step-{value}")))
    });

    let bag = window.present(journey);
    settle().await;

    signal.send(1);
    settle().await;
    assert_eq!(node.child_count(), 1);

    signal.finish();
    settle().await;
    assert!(bag.is_disposed());
    assert_eq!(window.root().child_count(), 0);
    assert_eq!(node.child_count(), 0);
}

#[tokio::test]
async fn configuration_closures_run_in_order() {
    let node = Node::new("host");
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first = order.clone();
    let second = order.clone();
    let journey = Journey::plain(leaf("screen"))
        .add_configuration(move |_| first.lock().push("first"))
        .add_configuration(move |_| second.lock().push("second"));

    let result = node.present(journey);
    assert!(matches!(result, JourneyPresentResult::Presented(_)));
    assert_eq!(&*order.lock(), &["first", "second"]);
}

#[tokio::test]
async fn cancel_journey_dismiss_swallows_the_dismissal() {
    let node = Node::new("host");
    let dismissed = Arc::new(AtomicUsize::new(0));

    let counter = dismissed.clone();
    let journey = Journey::plain(leaf("screen"))
        .add_configuration(|presenter| {
            presenter.dismisser.dismiss(Some(JourneyError::Dismissed));
        })
        .cancel_journey_dismiss()
        .on_dismiss(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let presented = node.present(journey);
    assert!(matches!(presented, JourneyPresentResult::Presented(_)));
    assert_eq!(dismissed.load(Ordering::SeqCst), 0);
    assert_eq!(node.child_count(), 1);
}

#[tokio::test]
async fn map_journey_dismiss_to_cancel_rewrites_the_error() {
    let node = Node::new("host");
    let errors: Arc<Mutex<Vec<JourneyError>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = errors.clone();
    let journey = Journey::plain(leaf("screen"))
        .add_configuration(|presenter| {
            presenter.dismisser.dismiss(Some(JourneyError::Dismissed));
        })
        .map_journey_dismiss_to_cancel()
        .on_error(move |error| {
            sink.lock().push(error.clone());
        });

    node.present(journey);
    assert_eq!(node.child_count(), 0);

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_cancelled());
}

#[tokio::test]
async fn dismiss_without_the_wrapper_reaches_observers() {
    let node = Node::new("host");
    let dismissed = Arc::new(AtomicUsize::new(0));

    let counter = dismissed.clone();
    let journey = Journey::plain(leaf("screen"))
        .add_configuration(|presenter| {
            presenter.dismisser.dismiss(Some(JourneyError::Dismissed));
        })
        .on_dismiss(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    node.present(journey);
    assert_eq!(dismissed.load(Ordering::SeqCst), 1);
    assert_eq!(node.child_count(), 0);
}

#[tokio::test]
async fn future_completion_finalizes_and_delivers_the_value() {
    let node = Node::new("host");
    let future: FutureResult<i32> = FutureResult::new();

    let screen = {
        let future = future.clone();
        AnyPresentable::new(move || {
            Produced::Matter(Node::new("prompt"), future.clone())
        })
    };

    let delivered: Arc<Mutex<Option<i32>>> = Arc::new(Mutex::new(None));
    let dismissed = Arc::new(AtomicUsize::new(0));

    let sink = delivered.clone();
    let counter = dismissed.clone();
    let journey = Journey::future(screen)
        .on_future_value(move |value| {
            *sink.lock() = Some(value);
        })
        .on_dismiss(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    node.present(journey);
    assert_eq!(node.child_count(), 1);

    future.succeed(7);
    assert_eq!(node.child_count(), 0);
    assert_eq!(dismissed.load(Ordering::SeqCst), 1);
    assert_eq!(*delivered.lock(), Some(7));
}

#[tokio::test]
async fn future_failure_drops_the_value() {
    let node = Node::new("host");
    let future: FutureResult<i32> = FutureResult::new();

    let screen = {
        let future = future.clone();
        AnyPresentable::new(move || {
            Produced::Matter(Node::new("prompt"), future.clone())
        })
    };

    let delivered: Arc<Mutex<Option<i32>>> = Arc::new(Mutex::new(None));
    let errors: Arc<Mutex<Vec<JourneyError>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = delivered.clone();
    let error_sink = errors.clone();
    let journey = Journey::future(screen)
        .on_future_value(move |value| {
            *sink.lock() = Some(value);
        })
        .on_error(move |error| {
            error_sink.lock().push(error.clone());
        });

    node.present(journey);
    future.fail(JourneyError::other(std::io::Error::other("backend unavailable")));

    assert_eq!(node.child_count(), 0);
    assert!(delivered.lock().is_none());
    assert_eq!(errors.lock().len(), 1);
}

#[tokio::test]
async fn conditional_presents_only_the_chosen_branch() {
    let node = Node::new("host");
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    let journey = conditionally(
        true,
        move || {
            Journey::plain(leaf("first")).add_configuration(move |presenter| {
                // The branch's configure sees its own concrete matter.
                sink.lock().push(presenter.matter.title().to_string());
            })
        },
        || Journey::plain(leaf("second")),
    );

    let result = node.present(journey);
    assert!(matches!(result, JourneyPresentResult::Presented(_)));
    assert_eq!(node.child_titles(), ["first"]);
    assert_eq!(&*seen.lock(), &["first"]);
}

#[tokio::test]
async fn sentinel_presentables_pass_through_plain_journeys() {
    let node = Node::new("host");

    let result = node.present(Journey::plain(journey_core::DismisserPresentable));
    assert!(matches!(result, JourneyPresentResult::ShouldDismiss));

    let result = node.present(Journey::plain(journey_core::PoperPresentable));
    assert!(matches!(result, JourneyPresentResult::ShouldPop));

    let result = node.present(Journey::plain(journey_core::ContinuerPresentable));
    assert!(matches!(result, JourneyPresentResult::ShouldContinue));

    assert_eq!(node.child_count(), 0);
}

#[tokio::test]
async fn optionally_none_leaves_the_stack_untouched() {
    let node = Node::new("host");

    let journey = journey_core::optionally(None::<journey_core::AnyJourney<Node, ()>>);
    let result = node.present(journey);

    assert!(matches!(result, JourneyPresentResult::ShouldContinue));
    assert_eq!(node.child_count(), 0);
}

#[tokio::test]
async fn on_value_observes_signal_emissions() {
    let node = Node::new("host");
    let signal = Signal::new();
    let screen_node = Node::new("picker");

    let seen: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    let journey = Journey::new(screen(&screen_node, &signal), |_: i32| ContinueJourney)
        .on_value(move |value| {
            sink.lock().push(*value);
        });

    node.present(journey);
    settle().await;

    signal.send(3);
    signal.send(4);
    settle().await;

    assert_eq!(&*seen.lock(), &[3, 4]);
}
