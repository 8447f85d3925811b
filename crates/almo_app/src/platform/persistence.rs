use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use almo_core::ChatSession;
use almo_logging::{almo_info, almo_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

const STATE_FILENAME: &str = ".almo_sessions.ron";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory unusable: {0}")]
    StateDir(String),
    #[error("could not serialize sessions: {0}")]
    Serialize(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    sessions: Vec<ChatSession>,
}

pub(crate) fn state_path(dir: &Path) -> PathBuf {
    dir.join(STATE_FILENAME)
}

/// Sessions saved by a previous run. Missing or unreadable state yields none.
pub(crate) fn load_sessions(dir: &Path) -> Vec<ChatSession> {
    let path = state_path(dir);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            almo_warn!("Failed to read saved sessions from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    match ron::from_str::<PersistedState>(&content) {
        Ok(state) => {
            almo_info!(
                "Loaded {} saved session(s) from {:?}",
                state.sessions.len(),
                path
            );
            state.sessions
        }
        Err(err) => {
            almo_warn!("Failed to parse saved sessions from {:?}: {}", path, err);
            Vec::new()
        }
    }
}

/// Writes the sessions to a temp file in `dir`, then renames it over the state file.
pub(crate) fn save_sessions(dir: &Path, sessions: &[ChatSession]) -> Result<PathBuf, PersistError> {
    ensure_state_dir(dir)?;

    let state = PersistedState {
        sessions: sessions.to_vec(),
    };
    let content = ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new())
        .map_err(|err| PersistError::Serialize(err.to_string()))?;

    let target = state_path(dir);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|err| PersistError::Io(err.error))?;

    almo_info!("Saved {} session(s) to {:?}", sessions.len(), target);
    Ok(target)
}

fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir("path is not a directory".into()));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))
}

#[cfg(test)]
mod tests {
    use almo_core::{AppState, Sender};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    fn sessions() -> Vec<ChatSession> {
        let mut sessions = AppState::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
            .sessions_snapshot();
        sessions[0].conversation_id = Some("conv-7".to_string());
        sessions
    }

    #[test]
    fn missing_state_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_sessions(dir.path()).is_empty());
    }

    #[test]
    fn saved_sessions_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let saved = sessions();

        let path = save_sessions(dir.path(), &saved).unwrap();
        assert_eq!(path, dir.path().join(".almo_sessions.ron"));

        let loaded = load_sessions(dir.path());
        assert_eq!(loaded, saved);
        assert_eq!(loaded[0].messages[0].sender, Sender::Assistant);
    }

    #[test]
    fn save_replaces_previous_state_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        save_sessions(dir.path(), &sessions()).unwrap();
        save_sessions(dir.path(), &[]).unwrap();

        assert!(load_sessions(dir.path()).is_empty());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_creates_missing_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        save_sessions(&nested, &sessions()).unwrap();
        assert_eq!(load_sessions(&nested).len(), 1);
    }

    #[test]
    fn state_dir_that_is_a_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            save_sessions(&file, &sessions()),
            Err(PersistError::StateDir(_))
        ));
    }

    #[test]
    fn corrupt_state_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(state_path(dir.path()), "not ron at all (").unwrap();
        assert!(load_sessions(dir.path()).is_empty());
    }
}
