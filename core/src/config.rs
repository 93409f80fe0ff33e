//! History configuration loaded from `history.toml`.
//!
//! ```toml
//! max_undo = 50
//! merge_window_ms = 250
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Settings for [`ActionHistory`](crate::undo::ActionHistory).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo depth. The oldest action is dropped once exceeded.
    pub max_undo: usize,
    /// Two consecutive actions with identical modality and categories are
    /// coalesced when the second one starts within this many milliseconds
    /// of the first one finishing. `0` disables merging.
    pub merge_window_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
            merge_window_ms: 0,
        }
    }
}

impl HistoryConfig {
    pub fn merge_window(&self) -> Duration {
        Duration::from_millis(self.merge_window_ms)
    }

    /// Parses a config from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a config, falling back to defaults if the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!(
                    "Loaded history config: max_undo={}, merge_window={}ms",
                    config.max_undo,
                    config.merge_window_ms
                );
                config
            }
            Err(e) => {
                log::warn!("No history config ({e}), using defaults");
                Self::default()
            }
        }
    }
}
