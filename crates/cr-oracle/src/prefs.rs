//! Player preferences persisted between sessions

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// Settings that survive a restart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Global audio mute
    pub muted: bool,
}

impl Preferences {
    /// Default preferences file under the platform config directory
    pub fn default_path() -> Result<PathBuf, PersistError> {
        dirs_next::config_dir()
            .map(|d| d.join("crimson-reels").join("preferences.json"))
            .ok_or(PersistError::NoDataDir)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from `path`; absence or corruption means defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::debug!("[Prefs] using defaults: {}", e);
            Self::default()
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
