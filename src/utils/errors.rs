//! Error handling for ClubPortal
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for ClubPortal application
#[derive(Error, Debug)]
pub enum ClubError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    RegistrationClosed(String),

    #[error("{message}")]
    Conflict {
        message: String,
        registration_id: Option<String>,
    },

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("{0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Mail delivery error: {0}")]
    Mail(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Rejections produced by the form template validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Submitter email is required")]
    MissingSubmitterEmail,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Email domain not allowed. Please use one of: {allowed}")]
    DomainNotAllowed { allowed: String },

    #[error("Number of participants must be between {min} and {max}")]
    ParticipantCount { min: u32, max: u32 },

    #[error("Participant {index} {problem}")]
    Participant { index: u32, problem: String },

    #[error("Missing required fields")]
    MissingFields(Vec<String>),

    #[error("Invalid email format for {label}")]
    InvalidFieldEmail { label: String },

    #[error("Registration form is inactive")]
    TemplateInactive,

    #[error("Invalid template id")]
    TemplateMismatch,

    #[error("Phone number is required for payment")]
    PhoneRequired,

    #[error("{0}")]
    Invalid(String),
}

/// Payment gateway adapter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment gateway unreachable: {0}")]
    Network(String),

    #[error("Payment gateway timeout")]
    Timeout,

    #[error("Payment gateway rejected credentials")]
    Unauthorized,

    #[error("Payment gateway returned status {status}")]
    Gateway { status: u16 },

    #[error("Invalid payment gateway response: {0}")]
    InvalidResponse(String),

    #[error("Invalid payment signature")]
    InvalidSignature,

    #[error("Payment not captured")]
    NotCaptured { status: String },

    #[error("Order ID mismatch")]
    OrderMismatch,

    #[error("Payment amount mismatch")]
    AmountMismatch { expected: u64, actual: u64 },

    #[error("Webhook not configured")]
    WebhookNotConfigured,
}

/// Result type alias for ClubPortal operations
pub type Result<T> = std::result::Result<T, ClubError>;

/// Result type alias for payment gateway operations
pub type PaymentResult<T> = std::result::Result<T, PaymentError>;

/// Outward error category, reported as the `code` of an error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Gateway,
    Storage,
    NotFound,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Gateway => "gateway",
            ErrorKind::Storage => "storage",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal",
        }
    }
}

impl ValidationError {
    /// Labels of every missing required field, when that is the failure
    pub fn missing(&self) -> Option<&[String]> {
        match self {
            ValidationError::MissingFields(labels) => Some(labels),
            _ => None,
        }
    }

    /// Human hint attached to the envelope's `details`
    pub fn details(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingSubmitterEmail => Some("Please provide your email address"),
            ValidationError::InvalidEmail => Some("Please provide a valid email address"),
            ValidationError::PhoneRequired => Some("Please provide a valid phone number"),
            _ => None,
        }
    }
}

impl PaymentError {
    /// Signature, capture and amount failures are the caller's problem; the rest are the gateway's
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidSignature
                | PaymentError::NotCaptured { .. }
                | PaymentError::OrderMismatch
                | PaymentError::AmountMismatch { .. }
        )
    }

    /// Public-safe explanation, never exposing provider bodies
    pub fn details(&self) -> Option<String> {
        match self {
            PaymentError::Unauthorized => Some(
                "Payment gateway configuration error. Please contact administrator.".to_string(),
            ),
            PaymentError::Network(_)
            | PaymentError::Timeout
            | PaymentError::Gateway { .. }
            | PaymentError::InvalidResponse(_) => {
                Some("Please try again or contact support.".to_string())
            }
            PaymentError::NotCaptured { status } => Some(format!("Payment status: {}", status)),
            PaymentError::AmountMismatch { expected, actual } => Some(format!(
                "Expected {:.2}, received {:.2}",
                *expected as f64 / 100.0,
                *actual as f64 / 100.0
            )),
            _ => None,
        }
    }
}

impl ClubError {
    /// Shorthand for a duplicate-registration conflict
    pub fn conflict(message: impl Into<String>) -> Self {
        ClubError::Conflict {
            message: message.into(),
            registration_id: None,
        }
    }

    /// Category in the outward error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClubError::Validation(_) => ErrorKind::Validation,
            ClubError::RegistrationClosed(_) => ErrorKind::Validation,
            ClubError::InvalidInput(_) => ErrorKind::Validation,
            ClubError::Conflict { .. } => ErrorKind::Conflict,
            ClubError::Payment(PaymentError::WebhookNotConfigured) => ErrorKind::Internal,
            ClubError::Payment(e) if e.is_verification_failure() => ErrorKind::Validation,
            ClubError::Payment(_) => ErrorKind::Gateway,
            ClubError::Mail(_) => ErrorKind::Gateway,
            ClubError::NotFound(_) => ErrorKind::NotFound,
            ClubError::Unauthorized(_) => ErrorKind::Unauthorized,
            ClubError::Storage(_) => ErrorKind::Storage,
            ClubError::Io(_) => ErrorKind::Storage,
            ClubError::Serialization(_) => ErrorKind::Storage,
            ClubError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClubError::Config(_) => false,
            ClubError::Validation(_) => false,
            ClubError::RegistrationClosed(_) => false,
            ClubError::Conflict { .. } => false,
            ClubError::Payment(e) => !e.is_verification_failure(),
            ClubError::NotFound(_) => false,
            ClubError::Unauthorized(_) => false,
            ClubError::Storage(_) => true,
            ClubError::Mail(_) => true,
            ClubError::Serialization(_) => false,
            ClubError::Io(_) => true,
            ClubError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ClubError::Config(_) => ErrorSeverity::Critical,
            ClubError::Storage(_) | ClubError::Io(_) | ClubError::Serialization(_) => {
                ErrorSeverity::Critical
            }
            ClubError::Unauthorized(_) => ErrorSeverity::Warning,
            ClubError::Payment(e) if e.is_verification_failure() => ErrorSeverity::Warning,
            ClubError::Payment(_) | ClubError::Mail(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
