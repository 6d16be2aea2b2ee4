//! Presentation-scoped handles.
//!
//! A [`JourneyPresenter`] is what configuration closures receive: the live
//! matter, the presentation's disposal scope and a [`Dismisser`] that ends
//! the presentation. Dismissers are plain closures, so combinators can rewrap
//! them to filter or rewrite the error that escapes a scope.

use std::sync::Arc;

use crate::bag::Bag;
use crate::error::JourneyError;

type DismissFn = Arc<dyn Fn(Option<JourneyError>) + Send + Sync>;

/// Ends a presentation, carrying `None` for a successful finish or an error
/// describing why the journey stopped. The host guarantees the underlying
/// teardown runs at most once regardless of how many clones call this.
#[derive(Clone)]
pub struct Dismisser {
    dismiss: DismissFn,
}

impl Dismisser {
    pub fn new(dismiss: impl Fn(Option<JourneyError>) + Send + Sync + 'static) -> Self {
        Self {
            dismiss: Arc::new(dismiss),
        }
    }

    /// A dismisser that drops the request.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn dismiss(&self, error: Option<JourneyError>) {
        (self.dismiss)(error);
    }

    /// Wraps this dismisser with an error filter: `f` returns the outcome to
    /// forward, or `None` to swallow the dismissal entirely.
    pub fn map(
        &self,
        f: impl Fn(Option<JourneyError>) -> Option<Option<JourneyError>> + Send + Sync + 'static,
    ) -> Dismisser {
        let inner = self.clone();
        Dismisser::new(move |error| {
            if let Some(forwarded) = f(error) {
                inner.dismiss(forwarded);
            }
        })
    }
}

/// Everything a configuration closure may touch while its presentation is
/// alive.
pub struct JourneyPresenter<M> {
    pub matter: M,
    pub bag: Bag,
    pub dismisser: Dismisser,
}

impl<M> JourneyPresenter<M> {
    pub fn new(matter: M, bag: Bag, dismisser: Dismisser) -> Self {
        Self {
            matter,
            bag,
            dismisser,
        }
    }

    /// The same presentation scope seen through different matter. Used when
    /// lifting a branch presenter into a composite type.
    pub fn with_matter<N>(&self, matter: N) -> JourneyPresenter<N> {
        JourneyPresenter {
            matter,
            bag: self.bag.clone(),
            dismisser: self.dismisser.clone(),
        }
    }

    /// The same presentation with a rewrapped dismisser.
    pub fn with_dismisser(&self, dismisser: Dismisser) -> JourneyPresenter<M>
    where
        M: Clone,
    {
        JourneyPresenter {
            matter: self.matter.clone(),
            bag: self.bag.clone(),
            dismisser,
        }
    }
}
