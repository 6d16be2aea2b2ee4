//! Store-driven journeys.
//!
//! These combinators let a journey react to a store: every action or state
//! emission builds a fresh nested journey and presents it through the
//! journey's own host. Sentinel results from the nested journey steer the
//! enclosing presentation exactly like a continuation would.

use std::sync::Arc;

use tokio::sync::mpsc;

use journey_core::host::{JourneyPresentResult, Matter};
use journey_core::presentation::{AnyJourney, JourneyPresentation};
use journey_core::JourneyError;

use crate::container::StoreContainer;
use crate::store::Store;

/// Journey combinators that react to stores resolved from a container.
pub trait StoreJourneyExt: JourneyPresentation {
    /// Presents a nested journey for every action `S` dispatches while this
    /// journey is on screen.
    fn on_action<S, Inner, F>(
        self,
        container: &Arc<StoreContainer>,
        content: F,
    ) -> AnyJourney<Self::Matter, Self::Result>
    where
        S: Store,
        Self::Matter: Matter,
        Inner: JourneyPresentation,
        Inner::Matter: Matter,
        F: Fn(&S::Action) -> Inner + Send + Sync + 'static,
    {
        let container = container.clone();
        let content = Arc::new(content);
        self.add_configuration(move |presenter| {
            let store = container.get::<S>();
            let (tx, rx) = mpsc::unbounded_channel();
            let subscription = store.subscribe_actions(move |action: &S::Action| {
                let _ = tx.send(action.clone());
            });
            presenter.bag.add_disposable(subscription);
            run_continuation(presenter, rx, content.clone());
        })
    }

    /// Presents a nested journey for every state change of `S` while this
    /// journey is on screen.
    fn on_state<S, Inner, F>(
        self,
        container: &Arc<StoreContainer>,
        content: F,
    ) -> AnyJourney<Self::Matter, Self::Result>
    where
        S: Store,
        Self::Matter: Matter,
        Inner: JourneyPresentation,
        Inner::Matter: Matter,
        F: Fn(&S::State) -> Inner + Send + Sync + 'static,
    {
        let container = container.clone();
        let content = Arc::new(content);
        self.add_configuration(move |presenter| {
            let store = container.get::<S>();
            let rx = store.state_signal().stream_into(&presenter.bag);
            run_continuation(presenter, rx, content.clone());
        })
    }
}

impl<J: JourneyPresentation> StoreJourneyExt for J {}

fn run_continuation<M, V, Inner>(
    presenter: &journey_core::JourneyPresenter<M>,
    mut rx: mpsc::UnboundedReceiver<V>,
    content: Arc<dyn Fn(&V) -> Inner + Send + Sync>,
) where
    M: Matter,
    V: Send + 'static,
    Inner: JourneyPresentation,
    Inner::Matter: Matter,
{
    let matter = presenter.matter.clone();
    let dismisser = presenter.dismisser.clone();
    let scope = presenter.bag.clone();
    presenter.bag.spawn(async move {
        while let Some(value) = rx.recv().await {
            let journey = content(&value);
            match matter.node().present(journey) {
                JourneyPresentResult::Presented(presented) => {
                    scope.hold(presented);
                }
                JourneyPresentResult::ShouldDismiss => {
                    dismisser.dismiss(Some(JourneyError::Dismissed));
                }
                JourneyPresentResult::ShouldPop => {
                    dismisser.dismiss(Some(JourneyError::Cancelled));
                }
                JourneyPresentResult::ShouldContinue => {}
            }
            if scope.is_disposed() {
                break;
            }
        }
    });
}
