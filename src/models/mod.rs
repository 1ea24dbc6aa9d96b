//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod form_template;
pub mod registration;
pub(crate) mod lenient;

// Re-export commonly used models
pub use event::{Event, EventStatus, RegistrationType, RegistrationDeadline, EventCatalog};
pub use form_template::{FormTemplate, FieldDefinition, to_minor_units};
pub use registration::{Registration, Participant, PaymentStatus, AttendanceStatus, Submission};
