//! State persistence.
//!
//! Each store serializes its whole state to one JSON file named after the
//! store, inside the container's persistence directory. Writes happen off
//! the sending context; a corrupt or missing file simply falls back to the
//! default state on restore.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// The file a store of the given name persists to.
pub fn store_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

pub fn write<T: Serialize>(path: &Path, state: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_vec(state)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}

/// Reads persisted state back, or `None` when the file is missing or does
/// not decode against the current state shape.
pub fn restore<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            if error.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %error, "could not read persisted state");
            }
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(state) => Some(state),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "persisted state did not decode; using defaults");
            None
        }
    }
}

/// Removes the persisted file, if any.
pub fn destroy(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        if error.kind() != ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), %error, "could not remove persisted state");
        }
    }
}
