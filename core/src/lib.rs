//! # Mapforge Core
//!
//! Core crate for the Mapforge terrain editor: the undo/redo change
//! journal, its configuration and the math types it shares with tools.

pub mod config;
pub mod error;
pub mod math;
pub mod undo;

pub use config::HistoryConfig;
pub use error::{ActionError, ActionResult, ConfigError};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the core version. Call once after the logger is installed.
pub fn init() {
    log::info!("Mapforge Core v{} initialized", VERSION);
}
