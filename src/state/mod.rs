//! State management module
//!
//! This module holds process-scoped application state and admin sessions

pub mod app_state;
pub mod sessions;

// Re-export commonly used state components
pub use app_state::AppState;
pub use sessions::{AdminSession, AdminSessionStore, SessionCleanupHandle};
