//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub registration: RegistrationConfig,
    pub payment: PaymentConfig,
    pub mail: MailConfig,
    pub admin: AdminConfig,
    pub club: ClubConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Externally reachable base URL, embedded in QR verification links
    pub public_base_url: String,
    pub request_timeout_seconds: u64,
}

/// JSON file storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Relative to `data_dir`
    pub registrations_dir: PathBuf,
    /// Ceiling for the per-file lock table before idle locks are evicted
    pub max_file_locks: usize,
}

/// Public registration rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationConfig {
    pub allowed_email_domains: Vec<String>,
    /// Offset of the deployment's civil time zone, used for deadline checks
    pub utc_offset_minutes: i32,
}

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: Option<String>,
    pub currency: String,
    pub timeout_seconds: u64,
}

/// SMTP configuration for confirmation mail
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub from_name: String,
    pub timeout_seconds: u64,
}

/// Admin panel credentials and session lifetime
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub token_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

/// Club identity used in outgoing mail
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClubConfig {
    pub name: String,
    pub college: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily rolling log file; stdout only when unset
    pub file_path: Option<String>,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub payments: bool,
    pub email_notifications: bool,
    pub qr_codes: bool,
}

impl Settings {
    /// Load settings from defaults, an optional `config` file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("CLUBPORTAL")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("registration.allowed_email_domains")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::ClubError> {
        super::validation::validate_settings(self)
    }

    /// Absolute directory holding one JSON list per event
    pub fn registrations_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.registrations_dir)
    }

    /// Path of the event catalog document
    pub fn events_path(&self) -> PathBuf {
        self.storage.data_dir.join("events.json")
    }

    /// Path of the form template catalog
    pub fn form_templates_path(&self) -> PathBuf {
        self.storage.data_dir.join("form_templates.json")
    }

    /// Civil time zone used for registration deadlines
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.registration.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment.timeout_seconds)
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_secs(self.mail.timeout_seconds)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                public_base_url: "http://localhost:8080".to_string(),
                request_timeout_seconds: 30,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
                registrations_dir: PathBuf::from("registrations"),
                max_file_locks: 100,
            },
            registration: RegistrationConfig {
                allowed_email_domains: vec![
                    "kongu.edu".to_string(),
                    "kongu.ac.in".to_string(),
                    "gmail.com".to_string(),
                ],
                utc_offset_minutes: 330,
            },
            payment: PaymentConfig {
                api_url: "https://api.razorpay.com/v1".to_string(),
                key_id: String::new(),
                key_secret: String::new(),
                webhook_secret: None,
                currency: "INR".to_string(),
                timeout_seconds: 15,
            },
            mail: MailConfig {
                smtp_host: "smtp.gmail.com".to_string(),
                smtp_port: 587,
                username: String::new(),
                password: String::new(),
                from_address: String::new(),
                from_name: "AI Coding Club".to_string(),
                timeout_seconds: 10,
            },
            admin: AdminConfig {
                username: "admin".to_string(),
                password: String::new(),
                token_ttl_seconds: 86_400,
                cleanup_interval_seconds: 600,
            },
            club: ClubConfig {
                name: "AI Coding Club".to_string(),
                college: String::new(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                json: false,
            },
            features: FeaturesConfig {
                payments: true,
                email_notifications: false,
                qr_codes: true,
            },
        }
    }
}
