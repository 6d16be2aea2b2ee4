pub mod bag;
pub mod conditional;
pub mod error;
pub mod host;
pub mod journey;
pub mod presentable;
pub mod presentation;
pub mod presenter;
pub mod sentinels;
pub mod signal;

pub use bag::{Bag, Disposable};
pub use conditional::{conditionally, group, optionally, ConditionalJourney, Either};
pub use error::JourneyError;
pub use host::{JourneyPresentResult, Matter, Node, PresentedJourney, Window};
pub use journey::Journey;
pub use presentable::{AnyPresentable, Presentable, Produced};
pub use presentation::{
    AnyJourney, Configure, JourneyPresentation, Materialized, OnDismiss, Presentation,
    PresentationOptions, PresentationStyle,
};
pub use presenter::{Dismisser, JourneyPresenter};
pub use sentinels::{
    ContinueJourney, ContinuerPresentable, DismissJourney, DismisserPresentable, PopJourney,
    PoperPresentable,
};
pub use signal::{Callbacker, FutureResult, ReadSignal, Signal, SignalEvent, StateSignal};
