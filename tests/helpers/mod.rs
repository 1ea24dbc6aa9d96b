//! Test helpers module
//!
//! Shared setup for the integration tests: a temporary data directory seeded
//! with events and form templates, a mock payment gateway, a recording mail
//! transport and request helpers that drive the full axum router.

#![allow(dead_code)]

pub mod mail_mock;
pub mod payment_mock;
pub mod test_context;
pub mod test_data;

pub use mail_mock::*;
pub use payment_mock::*;
pub use test_context::*;
pub use test_data::*;
