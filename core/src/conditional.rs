//! Branching journeys.
//!
//! [`ConditionalJourney`] is a true sum over two journey types: exactly one
//! branch exists, and materializing lifts that branch's matter and result
//! into [`Either`]. There is no "other side" to accidentally observe.

use std::sync::Arc;

use crate::host::{Matter, Node};
use crate::presentation::{
    Configure, JourneyPresentation, Materialized, Presentation, PresentationOptions,
    PresentationStyle,
};
use crate::sentinels::ContinueJourney;

/// One of two things.
#[derive(Clone, Debug)]
pub enum Either<A, B> {
    First(A),
    Second(B),
}

impl<A: Matter, B: Matter> Matter for Either<A, B> {
    fn node(&self) -> &Node {
        match self {
            Either::First(matter) => matter.node(),
            Either::Second(matter) => matter.node(),
        }
    }
}

/// A journey that is one of two alternatives, decided at construction.
pub enum ConditionalJourney<A, B> {
    First(A),
    Second(B),
}

impl<A, B> JourneyPresentation for ConditionalJourney<A, B>
where
    A: JourneyPresentation,
    B: JourneyPresentation,
{
    type Matter = Either<A::Matter, B::Matter>;
    type Result = Either<A::Result, B::Result>;

    fn style(&self) -> PresentationStyle {
        match self {
            Self::First(journey) => journey.style(),
            Self::Second(journey) => journey.style(),
        }
    }

    fn options(&self) -> PresentationOptions {
        match self {
            Self::First(journey) => journey.options(),
            Self::Second(journey) => journey.options(),
        }
    }

    fn materialize(self) -> Materialized<Self::Matter, Self::Result> {
        match self {
            Self::First(journey) => match journey.materialize() {
                Materialized::Show(presentation) => {
                    let Presentation {
                        matter,
                        result,
                        style,
                        options,
                        configure,
                        on_dismiss,
                    } = presentation;
                    // The lifted configure hands the branch its own concrete
                    // matter rather than projecting back out of the sum.
                    let branch_matter = matter.clone();
                    let lifted: Configure<Either<A::Matter, B::Matter>> =
                        Arc::new(move |presenter| {
                            configure(&presenter.with_matter(branch_matter.clone()));
                        });
                    Materialized::Show(Presentation {
                        matter: Either::First(matter),
                        result: Either::First(result),
                        style,
                        options,
                        configure: lifted,
                        on_dismiss,
                    })
                }
                Materialized::RequestDismiss => Materialized::RequestDismiss,
                Materialized::RequestPop => Materialized::RequestPop,
                Materialized::RequestContinue => Materialized::RequestContinue,
            },
            Self::Second(journey) => match journey.materialize() {
                Materialized::Show(presentation) => {
                    let Presentation {
                        matter,
                        result,
                        style,
                        options,
                        configure,
                        on_dismiss,
                    } = presentation;
                    let branch_matter = matter.clone();
                    let lifted: Configure<Either<A::Matter, B::Matter>> =
                        Arc::new(move |presenter| {
                            configure(&presenter.with_matter(branch_matter.clone()));
                        });
                    Materialized::Show(Presentation {
                        matter: Either::Second(matter),
                        result: Either::Second(result),
                        style,
                        options,
                        configure: lifted,
                        on_dismiss,
                    })
                }
                Materialized::RequestDismiss => Materialized::RequestDismiss,
                Materialized::RequestPop => Materialized::RequestPop,
                Materialized::RequestContinue => Materialized::RequestContinue,
            },
        }
    }
}

/// Picks one of two journeys based on `condition`. Only the chosen closure
/// runs.
pub fn conditionally<A, B>(
    condition: bool,
    first: impl FnOnce() -> A,
    second: impl FnOnce() -> B,
) -> ConditionalJourney<A, B>
where
    A: JourneyPresentation,
    B: JourneyPresentation,
{
    if condition {
        ConditionalJourney::First(first())
    } else {
        ConditionalJourney::Second(second())
    }
}

/// Lifts an optional journey; `None` leaves the stack untouched.
pub fn optionally<J>(journey: Option<J>) -> ConditionalJourney<J, ContinueJourney>
where
    J: JourneyPresentation,
{
    match journey {
        Some(journey) => ConditionalJourney::First(journey),
        None => ConditionalJourney::Second(ContinueJourney),
    }
}

/// Evaluates a journey-producing closure in place. Purely a grouping aid for
/// builder-style call sites.
pub fn group<J>(content: impl FnOnce() -> J) -> J
where
    J: JourneyPresentation,
{
    content()
}
