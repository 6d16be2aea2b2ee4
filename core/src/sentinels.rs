//! Stack control journeys.
//!
//! Returning one of these from a continuation builder steers the enclosing
//! journey instead of presenting anything. They materialize directly into
//! stack control requests; the host never sees matter for them.

use crate::host::Node;
use crate::presentable::{Presentable, Produced};
use crate::presentation::{
    JourneyPresentation, Materialized, PresentationOptions, PresentationStyle,
};

macro_rules! sentinel_journey {
    ($(#[$doc:meta])* $name:ident => $request:ident, $options:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl JourneyPresentation for $name {
            type Matter = Node;
            type Result = ();

            fn style(&self) -> PresentationStyle {
                PresentationStyle::Default
            }

            fn options(&self) -> PresentationOptions {
                $options
            }

            fn materialize(self) -> Materialized<Node, ()> {
                Materialized::$request
            }
        }
    };
}

sentinel_journey!(
    /// Dismisses the enclosing presentation.
    DismissJourney => RequestDismiss,
    PresentationOptions::DEFAULTS.with(PresentationOptions::AUTO_POP)
);

sentinel_journey!(
    /// Disposes the enclosing continuation scope without propagating a
    /// dismissal.
    PopJourney => RequestPop,
    PresentationOptions::DEFAULTS.with(PresentationOptions::AUTO_POP)
);

sentinel_journey!(
    /// Leaves the current presentation stack untouched.
    ContinueJourney => RequestContinue,
    PresentationOptions::NONE
);

macro_rules! sentinel_presentable {
    ($(#[$doc:meta])* $name:ident => $request:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl Presentable for $name {
            type Matter = Node;
            type Result = ();

            fn materialize(&self) -> Produced<Node, ()> {
                Produced::$request
            }
        }
    };
}

sentinel_presentable!(
    /// Presentable form of [`DismissJourney`], for composing through
    /// [`Journey::plain`](crate::journey::Journey::plain).
    DismisserPresentable => RequestDismiss
);

sentinel_presentable!(
    /// Presentable form of [`PopJourney`].
    PoperPresentable => RequestPop
);

sentinel_presentable!(
    /// Presentable form of [`ContinueJourney`].
    ContinuerPresentable => RequestContinue
);

