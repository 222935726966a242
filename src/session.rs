//! Client-local session persistence.
//!
//! The browser original kept its state in localStorage keys; here the same
//! layout lives in one explicit `SessionState` struct owned by the top-level
//! app, serialized as JSON to a file under the platform data directory.
//! Loaded once at startup, saved on every change. A corrupt or missing file
//! degrades to an empty session rather than failing startup.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::model::{SelectedChannel, SelectedUser};

/// Everything that survives an application restart: the access token, a
/// pending authorization code, and the selected user/channel.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub pending_code: Option<String>,
    #[serde(default)]
    pub selected_user: Option<SelectedUser>,
    #[serde(default)]
    pub selected_channel: Option<SelectedChannel>,
}

impl SessionState {
    /// Loads the session from `path`, degrading to the default empty session
    /// when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<SessionState>(&contents) {
                Ok(session) => {
                    info!(
                        "Restored session from {:?} (token: {}, user: {}, channel: {})",
                        path,
                        session.access_token.is_some(),
                        session.selected_user.is_some(),
                        session.selected_channel.is_some()
                    );
                    session
                }
                Err(e) => {
                    warn!("Discarding corrupt session file {:?}: {}", path, e);
                    SessionState::default()
                }
            },
            Err(e) => {
                debug!("No session restored from {:?}: {}", path, e);
                SessionState::default()
            }
        }
    }

    /// Writes the session to `path`. Persistence failures are logged and
    /// otherwise ignored; the in-memory session stays authoritative.
    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create session directory {:?}: {}", parent, e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    warn!("Failed to write session file {:?}: {}", path, e);
                } else {
                    debug!("Session saved to {:?}", path);
                }
            }
            Err(e) => warn!("Failed to serialize session: {}", e),
        }
    }

    /// Drops the access token and any pending authorization code, forcing
    /// re-authorization. Used on logout and on a failed token exchange.
    pub fn clear_auth(&mut self) {
        self.access_token = None;
        self.pending_code = None;
    }
}

/// Default location of the session file.
pub fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("arena-frame")
        .join("session.json")
}
