//! Error types for the action engine and its configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by [`Action`](crate::undo::Action) and
/// [`ActionHistory`](crate::undo::ActionHistory).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("action is sealed: it has already been finished")]
    Sealed,
    #[error("action is still recording and cannot be undone")]
    NotFinished,
    #[error("an action is currently being recorded")]
    ActionInProgress,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Result type for action operations.
pub type ActionResult<T = ()> = Result<T, ActionError>;

/// Errors raised while loading a [`HistoryConfig`](crate::config::HistoryConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
