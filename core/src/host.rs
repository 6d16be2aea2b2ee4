//! Presentation hosts.
//!
//! A [`Node`] is an entry in the presentation tree; presenting a journey on a
//! node attaches the journey's matter as a child and wires up dismissal.
//! [`Window`] is the root host an application hands its first journey to.
//!
//! The host is where "dismiss exactly once" is enforced: however many clones
//! of the dismisser exist, teardown and the `on_dismiss` observer run a
//! single time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::bag::Bag;
use crate::error::JourneyError;
use crate::presentation::{JourneyPresentation, Materialized, PresentationOptions, PresentationStyle};
use crate::presenter::{Dismisser, JourneyPresenter};

/// Anything a journey can show. The host only needs the [`Node`] inside to
/// attach it to the tree; the rest of the matter is the journey's business.
pub trait Matter: Clone + Send + Sync + 'static {
    fn node(&self) -> &Node;
}

struct ChildEntry {
    id: Uuid,
    node: Node,
    style: PresentationStyle,
    options: PresentationOptions,
    bag: Bag,
}

struct NodeInner {
    id: Uuid,
    title: String,
    children: Mutex<Vec<ChildEntry>>,
}

/// A host in the presentation tree. Cloning is cheap and clones share the
/// same tree entry.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Matter for Node {
    fn node(&self) -> &Node {
        self
    }
}

impl Node {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: Uuid::new_v4(),
                title: title.into(),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.lock().len()
    }

    /// Titles of currently attached children, in presentation order.
    pub fn child_titles(&self) -> Vec<String> {
        self.inner
            .children
            .lock()
            .iter()
            .map(|child| child.node.title().to_string())
            .collect()
    }

    /// Presents a journey on this node.
    ///
    /// Materializes the journey, attaches the produced matter as a child and
    /// returns the result handle together with a dismisser. Stack control
    /// requests present nothing and surface as the matching
    /// [`JourneyPresentResult`] variant for the caller to interpret.
    pub fn present<J>(&self, journey: J) -> JourneyPresentResult<J::Result>
    where
        J: JourneyPresentation,
        J::Matter: Matter,
    {
        let presentation = match journey.materialize() {
            Materialized::Show(presentation) => presentation,
            Materialized::RequestDismiss => return JourneyPresentResult::ShouldDismiss,
            Materialized::RequestPop => return JourneyPresentResult::ShouldPop,
            Materialized::RequestContinue => return JourneyPresentResult::ShouldContinue,
        };

        let child = presentation.matter.node().clone();
        let entry_id = Uuid::new_v4();
        let bag = Bag::new();

        tracing::debug!(
            host = %self.inner.title,
            child = %child.inner.title,
            style = ?presentation.style,
            "presenting"
        );

        self.inner.children.lock().push(ChildEntry {
            id: entry_id,
            node: child,
            style: presentation.style,
            options: presentation.options,
            bag: bag.clone(),
        });

        let dismissed = Arc::new(AtomicBool::new(false));
        let on_dismiss = presentation.on_dismiss.clone();
        let host = self.clone();
        let scope = bag.clone();
        let dismisser = Dismisser::new(move |error| {
            if dismissed.swap(true, Ordering::SeqCst) {
                return;
            }
            on_dismiss(error.as_ref());
            host.remove_child(entry_id);
            scope.dispose();
        });

        // Disposing the presentation's bag from the outside counts as a
        // cancellation, not a dismissal.
        let cancel = dismisser.clone();
        bag.add(move || cancel.dismiss(Some(JourneyError::Cancelled)));

        let presenter = JourneyPresenter::new(
            presentation.matter.clone(),
            bag.clone(),
            dismisser.clone(),
        );
        (presentation.configure)(&presenter);

        JourneyPresentResult::Presented(PresentedJourney {
            result: presentation.result,
            dismisser,
            bag,
        })
    }

    fn remove_child(&self, id: Uuid) {
        self.inner.children.lock().retain(|child| child.id != id);
    }

    /// Style and options of currently attached children, in presentation
    /// order.
    pub fn child_presentations(&self) -> Vec<(String, PresentationStyle, PresentationOptions)> {
        self.inner
            .children
            .lock()
            .iter()
            .map(|child| (child.node.title().to_string(), child.style, child.options))
            .collect()
    }

    /// Disposes every child presentation.
    pub fn dismiss_children(&self) {
        let bags: Vec<Bag> = self
            .inner
            .children
            .lock()
            .iter()
            .map(|child| child.bag.clone())
            .collect();
        for bag in bags {
            bag.dispose();
        }
    }
}

/// The outcome of [`Node::present`].
pub enum JourneyPresentResult<R> {
    /// The journey is on screen.
    Presented(PresentedJourney<R>),
    /// The journey asked the *caller's* presentation to dismiss.
    ShouldDismiss,
    /// The journey asked the caller's continuation scope to be disposed.
    ShouldPop,
    /// Nothing to do.
    ShouldContinue,
}

/// A live presentation: the journey's result handle plus control over its
/// lifetime.
pub struct PresentedJourney<R> {
    result: R,
    dismisser: Dismisser,
    bag: Bag,
}

impl<R> PresentedJourney<R> {
    pub fn result(&self) -> &R {
        &self.result
    }

    pub fn into_result(self) -> R {
        self.result
    }

    pub fn dismiss(&self, error: Option<JourneyError>) {
        self.dismisser.dismiss(error);
    }

    pub fn bag(&self) -> &Bag {
        &self.bag
    }
}

/// The root of the presentation tree.
pub struct Window {
    root: Node,
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl Window {
    pub fn new() -> Self {
        Self {
            root: Node::new("window"),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Presents the application's root journey and keeps it alive until the
    /// returned bag is disposed.
    pub fn present<J>(&self, journey: J) -> Bag
    where
        J: JourneyPresentation,
        J::Matter: Matter,
    {
        match self.root.present(journey) {
            JourneyPresentResult::Presented(presented) => {
                let bag = presented.bag().clone();
                bag.hold(presented);
                bag
            }
            JourneyPresentResult::ShouldDismiss
            | JourneyPresentResult::ShouldPop
            | JourneyPresentResult::ShouldContinue => {
                tracing::warn!("root journey produced a stack control request; nothing presented");
                Bag::new()
            }
        }
    }
}
