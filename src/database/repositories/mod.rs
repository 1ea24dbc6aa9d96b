//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod event;
pub mod form_template;
pub mod registration;

// Re-export repositories
pub use event::EventRepository;
pub use form_template::FormTemplateRepository;
pub use registration::RegistrationRepository;
