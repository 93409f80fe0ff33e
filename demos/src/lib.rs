//! # Mapforge Demos
//!
//! Headless demo sessions showcasing the Mapforge undo journal.
//!
//! ## Available Demos
//!
//! - `edit_session` - Scripted sculpt/paint/object session with undo and redo

pub mod session;

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
