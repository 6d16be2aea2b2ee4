pub mod container;
pub mod debugger;
pub mod effect;
pub mod journey_ext;
pub mod persistence;
pub mod store;

pub use container::StoreContainer;
pub use debugger::{DebugHandle, InjectError, StoreDebugger};
pub use effect::Effect;
pub use journey_ext::StoreJourneyExt;
pub use persistence::PersistenceError;
pub use store::{EffectId, StateStore, Store};
