//! UI preferences on disk (`state.json` next to `config.toml`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Error as SerdeError;
use tracing::warn;

use crate::config::project_dirs;
use crate::domain::PersistedState;

const STATE_FILENAME: &str = "state.json";

fn data_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(STATE_FILENAME))
}

pub fn load_persisted_state() -> Option<PersistedState> {
    load_from(&data_file()?)
}

pub fn save_persisted_state(state: &PersistedState) -> Result<(), PersistSaveError> {
    let path = data_file().ok_or(PersistSaveError::StorageUnavailable)?;
    save_to(&path, state)
}

fn load_from(path: &Path) -> Option<PersistedState> {
    let data = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(state) => Some(state),
        Err(err) => {
            warn!("[state] ignoring unreadable {}: {err}", path.display());
            None
        }
    }
}

fn save_to(path: &Path, state: &PersistedState) -> Result<(), PersistSaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}
