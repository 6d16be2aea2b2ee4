//! Journey termination errors.

use std::sync::Arc;

use thiserror::Error;

/// Why a journey ended.
///
/// `Dismissed` is the cooperative "user closed this flow" signal and is what
/// auto-pop propagation reacts to. `Cancelled` means the presentation was torn
/// down from the outside (a sibling replaced it, or its scope was disposed)
/// and never propagates.
#[derive(Clone, Debug, Error)]
pub enum JourneyError {
    #[error("journey dismissed")]
    Dismissed,

    #[error("journey cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

impl JourneyError {
    pub fn other(error: impl Into<anyhow::Error>) -> Self {
        Self::Other(Arc::new(error.into()))
    }

    pub fn is_dismissed(&self) -> bool {
        matches!(self, Self::Dismissed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
