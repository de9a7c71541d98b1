//! Flat-file persistence of the monitoring snapshot.

use crate::types::PersistedState;
use common::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Loads and saves the last known state as a JSON blob.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the last persisted state, falling back to an empty default when
    /// the file is absent or unreadable. Never fails the process.
    pub fn load(&self) -> PersistedState {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "State file corrupt, starting from empty state"
                    );
                    PersistedState::default()
                }
            },
            Err(e) => {
                info!(
                    path = %self.path.display(),
                    error = %e,
                    "No state file, starting from empty state"
                );
                PersistedState::default()
            }
        }
    }

    /// Persist the state via a temp-file rename so a crash mid-write cannot
    /// truncate the previous snapshot.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        let contents = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
