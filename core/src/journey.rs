//! The typed journey constructor.
//!
//! `Journey` binds a [`Presentable`] to a continuation: what to present next
//! once the presentable's result produces a value. The continuation runs as a
//! task scoped to the presentation's [`Bag`](crate::bag::Bag), fed by the
//! result signal; each value builds a fresh nested journey and presents it on
//! the journey's own matter.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::JourneyError;
use crate::host::{JourneyPresentResult, Matter};
use crate::presentable::{Presentable, Produced};
use crate::presentation::{
    Configure, JourneyPresentation, Materialized, OnDismiss, Presentation, PresentationOptions,
    PresentationStyle,
};
use crate::signal::{FutureResult, Signal, SignalEvent};

type Transform<R> = Box<dyn FnOnce(R) -> R + Send>;

/// A journey built from a presentable plus continuation wiring.
pub struct Journey<P: Presentable> {
    presentable: P,
    style: PresentationStyle,
    options: PresentationOptions,
    transform: Transform<P::Result>,
    configure: Configure<P::Matter>,
    on_dismiss: OnDismiss,
}

impl<P> JourneyPresentation for Journey<P>
where
    P: Presentable,
    P::Matter: Clone + Send + Sync + 'static,
    P::Result: Send + 'static,
{
    type Matter = P::Matter;
    type Result = P::Result;

    fn style(&self) -> PresentationStyle {
        self.style
    }

    fn options(&self) -> PresentationOptions {
        self.options
    }

    fn materialize(self) -> Materialized<P::Matter, P::Result> {
        match self.presentable.materialize() {
            Produced::Matter(matter, result) => Materialized::Show(Presentation {
                matter,
                result: (self.transform)(result),
                style: self.style,
                options: self.options,
                configure: self.configure,
                on_dismiss: self.on_dismiss,
            }),
            Produced::RequestDismiss => Materialized::RequestDismiss,
            Produced::RequestPop => Materialized::RequestPop,
            Produced::RequestContinue => Materialized::RequestContinue,
        }
    }
}

impl<P, V> Journey<P>
where
    P: Presentable<Result = Signal<V>>,
    P::Matter: Matter,
    V: Clone + Send + 'static,
{
    /// A journey over a signal-producing presentable: every value the signal
    /// emits builds the next nested journey via `content`. Defaults to
    /// `DEFAULTS | AUTO_POP`.
    pub fn new<Inner>(presentable: P, content: impl Fn(V) -> Inner + Send + Sync + 'static) -> Self
    where
        Inner: JourneyPresentation,
        Inner::Matter: Matter,
    {
        Self::styled(
            presentable,
            PresentationStyle::Default,
            PresentationOptions::DEFAULTS | PresentationOptions::AUTO_POP,
            content,
        )
    }

    /// [`Journey::new`] with explicit style and options. The `options` given
    /// here also gate dismiss propagation in the continuation, so set them at
    /// construction rather than with a later combinator.
    pub fn styled<Inner>(
        presentable: P,
        style: PresentationStyle,
        options: PresentationOptions,
        content: impl Fn(V) -> Inner + Send + Sync + 'static,
    ) -> Self
    where
        Inner: JourneyPresentation,
        Inner::Matter: Matter,
    {
        let captured: Arc<Mutex<Option<Signal<V>>>> = Arc::new(Mutex::new(None));
        let content = Arc::new(content);

        let storing = captured.clone();
        let transform: Transform<Signal<V>> = Box::new(move |signal| {
            *storing.lock() = Some(signal.clone());
            signal
        });

        let configure: Configure<P::Matter> = Arc::new(move |presenter| {
            let signal = match captured.lock().clone() {
                Some(signal) => signal,
                None => return,
            };
            let mut events = signal.stream_into(&presenter.bag);
            let matter = presenter.matter.clone();
            let dismisser = presenter.dismisser.clone();
            let scope = presenter.bag.clone();
            let content = content.clone();

            presenter.bag.spawn(async move {
                // Held for its drop side effect: assigning cancels whatever
                // nested journey is currently shown.
                let mut _current = None;
                while let Some(event) = events.recv().await {
                    match event {
                        SignalEvent::Value(value) => {
                            let child = content(value);
                            let child_options = child.options();

                            _current = None;

                            let parent_dismisser = dismisser.clone();
                            let parent_scope = scope.clone();
                            let child = child.on_error(move |error| {
                                if error.is_dismissed() {
                                    if options.contains(PresentationOptions::AUTO_POP) {
                                        parent_dismisser
                                            .dismiss(Some(JourneyError::Dismissed));
                                    }
                                    if child_options.contains(PresentationOptions::AUTO_POP) {
                                        parent_scope.dispose();
                                    }
                                }
                            });

                            match matter.node().present(child) {
                                JourneyPresentResult::Presented(presented) => {
                                    _current = Some(ScopedChild::new(presented));
                                }
                                JourneyPresentResult::ShouldDismiss => {
                                    if options.contains(PresentationOptions::AUTO_POP) {
                                        dismisser.dismiss(Some(JourneyError::Dismissed));
                                    }
                                    if child_options.contains(PresentationOptions::AUTO_POP) {
                                        scope.dispose();
                                    }
                                }
                                JourneyPresentResult::ShouldPop => {
                                    scope.dispose();
                                }
                                JourneyPresentResult::ShouldContinue => {}
                            }
                        }
                        SignalEvent::End => {
                            scope.dispose();
                        }
                    }
                    if scope.is_disposed() {
                        break;
                    }
                }
            });
        });

        Journey {
            presentable,
            style,
            options,
            transform,
            configure,
            on_dismiss: Arc::new(|_| {}),
        }
    }
}

impl<P, V> Journey<P>
where
    P: Presentable<Result = FutureResult<V>>,
    P::Matter: Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    /// A journey over a single-shot result: completion finalizes the
    /// presentation, dismissing with `None` on success or the error on
    /// failure.
    pub fn future(presentable: P) -> Self {
        Self::future_styled(
            presentable,
            PresentationStyle::Default,
            PresentationOptions::DEFAULTS | PresentationOptions::AUTO_POP,
        )
    }

    pub fn future_styled(
        presentable: P,
        style: PresentationStyle,
        options: PresentationOptions,
    ) -> Self {
        let captured: Arc<Mutex<Option<FutureResult<V>>>> = Arc::new(Mutex::new(None));

        let storing = captured.clone();
        let transform: Transform<FutureResult<V>> = Box::new(move |future| {
            *storing.lock() = Some(future.clone());
            future
        });

        let configure: Configure<P::Matter> = Arc::new(move |presenter| {
            let future = match captured.lock().clone() {
                Some(future) => future,
                None => return,
            };
            let dismisser = presenter.dismisser.clone();
            future.on_result(move |result| match result {
                Ok(_) => dismisser.dismiss(None),
                Err(error) => dismisser.dismiss(Some(error.clone())),
            });
        });

        Journey {
            presentable,
            style,
            options,
            transform,
            configure,
            on_dismiss: Arc::new(|_| {}),
        }
    }
}

impl<P> Journey<P>
where
    P: Presentable,
    P::Matter: Clone + Send + Sync + 'static,
    P::Result: Send + 'static,
{
    /// A terminal leaf journey: the presentation just stays until dismissed
    /// from the outside; no continuation logic applies.
    pub fn plain(presentable: P) -> Self {
        Self::plain_styled(
            presentable,
            PresentationStyle::Default,
            PresentationOptions::DEFAULTS | PresentationOptions::AUTO_POP,
        )
    }

    pub fn plain_styled(
        presentable: P,
        style: PresentationStyle,
        options: PresentationOptions,
    ) -> Self {
        Journey {
            presentable,
            style,
            options,
            transform: Box::new(|result| result),
            configure: Arc::new(|_| {}),
            on_dismiss: Arc::new(|_| {}),
        }
    }
}

/// A presented child whose lifetime follows this handle: dropping it cancels
/// the child's presentation.
struct ScopedChild<R> {
    presented: crate::host::PresentedJourney<R>,
}

impl<R> ScopedChild<R> {
    fn new(presented: crate::host::PresentedJourney<R>) -> Self {
        Self { presented }
    }
}

impl<R> Drop for ScopedChild<R> {
    fn drop(&mut self) {
        self.presented.dismiss(Some(JourneyError::Cancelled));
    }
}
