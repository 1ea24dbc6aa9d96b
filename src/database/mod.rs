//! Database module
//!
//! This module handles the JSON file storage: per-file locks, the crash-safe
//! record store and the repositories built on top of it

pub mod locks;
pub mod record_store;
pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use locks::LockManager;
pub use record_store::{AppendOutcome, RecordStore, Sequenced};
pub use repositories::{EventRepository, FormTemplateRepository, RegistrationRepository};
pub use service::DatabaseService;
