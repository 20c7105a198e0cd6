//! Whole-document JSON persistence.

use crate::error::CoreError;
use crate::state::AppState;
use log::{info, warn};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores the application document at a fixed path.
///
/// Every mutation rewrites the whole document; there are no partial
/// updates and no concurrent writers beyond the lock held here.
pub struct StateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, healing a missing or corrupt file by writing
    /// a fresh default in its place. Corruption is logged, never
    /// surfaced.
    pub fn load_or_init(&self) -> AppState {
        if !self.path.exists() {
            let state = AppState::default();
            if let Err(err) = self.save(&state) {
                warn!("failed to write initial state document: {err}");
            }
            return state;
        }
        match fs::read_to_string(&self.path)
            .map_err(CoreError::from)
            .and_then(|raw| serde_json::from_str::<AppState>(&raw).map_err(CoreError::from))
        {
            Ok(state) => state,
            Err(err) => {
                warn!("state document unreadable, resetting to defaults: {err}");
                let state = AppState::default();
                if let Err(err) = self.save(&state) {
                    warn!("failed to reset state document: {err}");
                }
                state
            }
        }
    }

    /// Rewrite the document in full.
    pub fn save(&self, state: &AppState) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, raw)?;
        info!("state document saved (chats={})", state.chats.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StateStore;
    use crate::state::AppState;
    use deskpilot_protocol::ChatSession;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_initializes_defaults_on_disk() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("app.json");
        let store = StateStore::new(&path);
        let state = store.load_or_init();
        assert_eq!(state, AppState::default());
        assert_eq!(path.exists(), true);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().expect("tempdir");
        let store = StateStore::new(dir.path().join("app.json"));
        let mut state = AppState::default();
        state.chats.push(ChatSession::new("kept chat"));
        state.ensure_active_chat();
        store.save(&state).expect("save");
        assert_eq!(store.load_or_init(), state);
    }

    #[test]
    fn corrupt_file_resets_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("app.json");
        std::fs::write(&path, "{not json").expect("write garbage");
        let store = StateStore::new(&path);
        let state = store.load_or_init();
        assert_eq!(state, AppState::default());
        // The healed document must parse on the next load.
        assert_eq!(store.load_or_init(), AppState::default());
    }
}
