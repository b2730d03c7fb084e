//! JSON file holding the pause schedule and statistics across restarts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use croupier_core::PersistedState;
use croupier_utils::{AtomicWriteOptions, atomic_write_with_options, recover_bak_file};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("state file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    options: AtomicWriteOptions,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: AtomicWriteOptions {
                sync_parent_dir: true,
                ..AtomicWriteOptions::default()
            },
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved state. `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        recover_bak_file(&self.path);
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No saved state, starting fresh");
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(state).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        atomic_write_with_options(&self.path, &json, self.options).map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use croupier_core::{PauseScheduler, Tally};
    use croupier_types::Outcome;

    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));

        let mut pause = PauseScheduler::new(&[Duration::from_secs(60), Duration::from_secs(90)], 5).unwrap();
        pause.start_pause(Utc::now());
        let mut tally = Tally::default();
        tally.record(Outcome::Won(1));
        let state = PersistedState {
            pause: pause.schedule().clone(),
            tally,
        };

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
    }

    #[test]
    fn recovers_from_bak() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = StateStore::new(&path);
        store.save(&PersistedState::default()).unwrap();
        fs::rename(&path, path.with_extension("bak")).unwrap();
        assert_eq!(store.load().unwrap(), Some(PersistedState::default()));
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            StateStore::new(&path).load(),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
