//! Journey presentations and combinators.
//!
//! A [`JourneyPresentation`] describes one step of a flow: how to build the
//! matter, how to present it and what happens around its lifetime. Combinators
//! never mutate a presentation in place; each one erases into the canonical
//! [`AnyJourney`] and wraps the materialization, so a chain of combinators is
//! a chain of closures applied exactly once when the host materializes.

use std::ops::BitOr;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::JourneyError;
use crate::presenter::JourneyPresenter;
use crate::signal::{FutureResult, Signal};

/// How the host should place the matter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PresentationStyle {
    /// Pushed onto the host's stack.
    #[default]
    Default,
    /// Shown above the host as a self-contained scope.
    Modal,
    /// Embedded inside the host's own matter.
    Embedded,
}

/// Presentation option flags.
///
/// `DEFAULTS | AUTO_POP` is the baseline for journeys built with
/// [`Journey::new`](crate::journey::Journey::new); `AUTO_POP` is what makes a
/// child's dismissal collapse the whole chain upward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentationOptions {
    bits: u8,
}

impl PresentationOptions {
    pub const NONE: Self = Self { bits: 0 };
    pub const DEFAULTS: Self = Self { bits: 1 };
    pub const AUTO_POP: Self = Self { bits: 1 << 1 };
    pub const UNANIMATED: Self = Self { bits: 1 << 2 };

    pub fn contains(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    pub fn with(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    pub fn without(self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    pub fn is_empty(self) -> bool {
        self.bits == 0
    }
}

impl BitOr for PresentationOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

/// Configuration run while the presentation is alive.
pub type Configure<M> = Arc<dyn Fn(&JourneyPresenter<M>) + Send + Sync>;

/// Observer of the presentation's end. `None` is a clean finish.
pub type OnDismiss = Arc<dyn Fn(Option<&JourneyError>) + Send + Sync>;

/// A fully materialized presentation, ready for a host to show.
pub struct Presentation<M, R> {
    pub matter: M,
    pub result: R,
    pub style: PresentationStyle,
    pub options: PresentationOptions,
    pub configure: Configure<M>,
    pub on_dismiss: OnDismiss,
}

/// What materializing a journey yielded: something to show, or a stack
/// control request the host interprets without presenting anything.
pub enum Materialized<M, R> {
    Show(Presentation<M, R>),
    RequestDismiss,
    RequestPop,
    RequestContinue,
}

/// One step of a journey.
///
/// `materialize` consumes the presentation: result transforms registered by
/// combinators run exactly once, inside it. Combinators are provided methods
/// that erase into [`AnyJourney`].
pub trait JourneyPresentation: Sized + Send + 'static {
    type Matter: Clone + Send + Sync + 'static;
    type Result: Send + 'static;

    fn style(&self) -> PresentationStyle;

    fn options(&self) -> PresentationOptions;

    fn materialize(self) -> Materialized<Self::Matter, Self::Result>;

    /// Erases to the canonical boxed journey.
    fn into_any(self) -> AnyJourney<Self::Matter, Self::Result> {
        AnyJourney {
            style: self.style(),
            options: self.options(),
            mk: Box::new(move || self.materialize()),
        }
    }

    /// Transforms the result handle before the owner sees it.
    fn map(
        self,
        f: impl FnOnce(Self::Result) -> Self::Result + Send + 'static,
    ) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().map(f)
    }

    /// Runs `callback` when the journey materializes into something shown.
    fn on_present(
        self,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().on_present(callback)
    }

    /// Runs `callback` when the presentation ends, for any reason.
    fn on_dismiss(
        self,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().on_dismiss(callback)
    }

    /// Runs `callback` when the presentation ends with an error.
    fn on_error(
        self,
        callback: impl Fn(&JourneyError) + Send + Sync + 'static,
    ) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().on_error(callback)
    }

    /// Appends a configuration closure; closures run in the order they were
    /// added, after the journey's own wiring.
    fn add_configuration(
        self,
        configure: impl Fn(&JourneyPresenter<Self::Matter>) + Send + Sync + 'static,
    ) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().add_configuration(configure)
    }

    /// Swallows dismissed-errors raised through the presenter's dismisser, so
    /// an inner "close everything" stops at this boundary.
    fn cancel_journey_dismiss(self) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().cancel_journey_dismiss()
    }

    /// Rewrites dismissed-errors raised through the presenter's dismisser
    /// into cancellations, which never propagate further.
    fn map_journey_dismiss_to_cancel(self) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().map_journey_dismiss_to_cancel()
    }

    fn with_style(self, style: PresentationStyle) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().with_style(style)
    }

    fn with_options(
        self,
        options: PresentationOptions,
    ) -> AnyJourney<Self::Matter, Self::Result> {
        self.into_any().with_options(options)
    }

    /// Observes every value the journey's signal emits while presented.
    fn on_value<V>(
        self,
        callback: impl Fn(&V) + Send + Sync + 'static,
    ) -> AnyJourney<Self::Matter, Self::Result>
    where
        Self: JourneyPresentation<Result = Signal<V>>,
        V: Clone + Send + 'static,
    {
        self.into_any().map(move |signal: Signal<V>| {
            let _retained = signal.on_value(move |value| callback(value));
            signal
        })
    }

    /// Delivers the future's value after the presentation finishes cleanly.
    /// An errored or cancelled dismissal drops the value.
    fn on_future_value<V>(
        self,
        callback: impl Fn(V) + Send + Sync + 'static,
    ) -> AnyJourney<Self::Matter, Self::Result>
    where
        Self: JourneyPresentation<Result = FutureResult<V>>,
        V: Clone + Send + 'static,
    {
        let captured: Arc<Mutex<Option<V>>> = Arc::new(Mutex::new(None));
        let storing = captured.clone();
        self.into_any()
            .map(move |future: FutureResult<V>| {
                future.on_result(move |result| {
                    if let Ok(value) = result {
                        *storing.lock() = Some(value.clone());
                    }
                });
                future
            })
            .wrap(move |mut presentation| {
                let previous = presentation.on_dismiss.clone();
                presentation.on_dismiss = Arc::new(move |error| {
                    previous(error);
                    if error.is_none() {
                        if let Some(value) = captured.lock().take() {
                            callback(value);
                        }
                    }
                });
                presentation
            })
    }
}

type MkFn<M, R> = Box<dyn FnOnce() -> Materialized<M, R> + Send>;

/// The canonical type-erased journey every combinator produces.
pub struct AnyJourney<M, R> {
    style: PresentationStyle,
    options: PresentationOptions,
    mk: MkFn<M, R>,
}

impl<M, R> AnyJourney<M, R>
where
    M: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    /// Wraps the eventual presentation. Stack control requests pass through
    /// untouched.
    fn wrap(
        self,
        f: impl FnOnce(Presentation<M, R>) -> Presentation<M, R> + Send + 'static,
    ) -> Self {
        Self {
            style: self.style,
            options: self.options,
            mk: Box::new(move || match (self.mk)() {
                Materialized::Show(presentation) => Materialized::Show(f(presentation)),
                Materialized::RequestDismiss => Materialized::RequestDismiss,
                Materialized::RequestPop => Materialized::RequestPop,
                Materialized::RequestContinue => Materialized::RequestContinue,
            }),
        }
    }

    pub fn map(self, f: impl FnOnce(R) -> R + Send + 'static) -> Self {
        self.wrap(move |mut presentation| {
            presentation.result = f(presentation.result);
            presentation
        })
    }

    pub fn on_present(self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.wrap(move |presentation| {
            callback();
            presentation
        })
    }

    pub fn on_dismiss(self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.wrap(move |mut presentation| {
            let previous = presentation.on_dismiss.clone();
            presentation.on_dismiss = Arc::new(move |error| {
                previous(error);
                callback();
            });
            presentation
        })
    }

    pub fn on_error(self, callback: impl Fn(&JourneyError) + Send + Sync + 'static) -> Self {
        self.wrap(move |mut presentation| {
            let previous = presentation.on_dismiss.clone();
            presentation.on_dismiss = Arc::new(move |error| {
                previous(error);
                if let Some(error) = error {
                    callback(error);
                }
            });
            presentation
        })
    }

    pub fn add_configuration(
        self,
        configure: impl Fn(&JourneyPresenter<M>) + Send + Sync + 'static,
    ) -> Self {
        self.wrap(move |mut presentation| {
            let previous = presentation.configure.clone();
            presentation.configure = Arc::new(move |presenter| {
                previous(presenter);
                configure(presenter);
            });
            presentation
        })
    }

    pub fn cancel_journey_dismiss(self) -> Self {
        self.map_dismisser(|error| match error {
            Some(err) if err.is_dismissed() => None,
            other => Some(other),
        })
    }

    pub fn map_journey_dismiss_to_cancel(self) -> Self {
        self.map_dismisser(|error| match error {
            Some(err) if err.is_dismissed() => Some(Some(JourneyError::Cancelled)),
            other => Some(other),
        })
    }

    fn map_dismisser(
        self,
        f: impl Fn(Option<JourneyError>) -> Option<Option<JourneyError>>
            + Send
            + Sync
            + Clone
            + 'static,
    ) -> Self {
        self.wrap(move |mut presentation| {
            let previous = presentation.configure.clone();
            presentation.configure = Arc::new(move |presenter| {
                let mapped = presenter.dismisser.map(f.clone());
                previous(&presenter.with_dismisser(mapped));
            });
            presentation
        })
    }

    pub fn with_style(self, style: PresentationStyle) -> Self {
        let mut journey = self.wrap(move |mut presentation| {
            presentation.style = style;
            presentation
        });
        journey.style = style;
        journey
    }

    pub fn with_options(self, options: PresentationOptions) -> Self {
        let mut journey = self.wrap(move |mut presentation| {
            presentation.options = options;
            presentation
        });
        journey.options = options;
        journey
    }
}

impl<M, R> JourneyPresentation for AnyJourney<M, R>
where
    M: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    type Matter = M;
    type Result = R;

    fn style(&self) -> PresentationStyle {
        self.style
    }

    fn options(&self) -> PresentationOptions {
        self.options
    }

    fn materialize(self) -> Materialized<M, R> {
        (self.mk)()
    }

    fn into_any(self) -> AnyJourney<M, R> {
        self
    }
}
