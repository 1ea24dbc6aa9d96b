//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{ClubError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_storage_config(&settings.storage)?;
    validate_registration_config(&settings.registration)?;
    validate_admin_config(&settings.admin)?;
    validate_logging_config(&settings.logging)?;

    if settings.features.payments {
        validate_payment_config(&settings.payment)?;
    }

    if settings.features.email_notifications {
        validate_mail_config(&settings.mail)?;
    }

    Ok(())
}

/// Validate HTTP server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.bind_address.is_empty() {
        return Err(ClubError::Config(
            "Server bind address is required".to_string()
        ));
    }

    if url::Url::parse(&config.public_base_url).is_err() {
        return Err(ClubError::Config(
            format!("Invalid public base URL: {}", config.public_base_url)
        ));
    }

    Ok(())
}

/// Validate storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.data_dir.as_os_str().is_empty() {
        return Err(ClubError::Config(
            "Data directory is required".to_string()
        ));
    }

    if config.max_file_locks == 0 {
        return Err(ClubError::Config(
            "Max file locks must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate public registration rules
fn validate_registration_config(config: &super::RegistrationConfig) -> Result<()> {
    if config.allowed_email_domains.iter().all(|d| d.trim().is_empty()) {
        return Err(ClubError::Config(
            "At least one allowed email domain must be configured".to_string()
        ));
    }

    if config.utc_offset_minutes.abs() > 14 * 60 {
        return Err(ClubError::Config(
            format!("UTC offset out of range: {} minutes", config.utc_offset_minutes)
        ));
    }

    Ok(())
}

/// Validate payment gateway configuration
fn validate_payment_config(config: &super::PaymentConfig) -> Result<()> {
    if config.key_id.is_empty() || config.key_secret.is_empty() {
        return Err(ClubError::Config(
            "Payment key id and key secret are required when payments are enabled".to_string()
        ));
    }

    if config.api_url.is_empty() {
        return Err(ClubError::Config(
            "Payment API URL is required".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(ClubError::Config(
            "Payment timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate SMTP configuration
fn validate_mail_config(config: &super::MailConfig) -> Result<()> {
    if config.smtp_host.is_empty() {
        return Err(ClubError::Config(
            "SMTP host is required when email notifications are enabled".to_string()
        ));
    }

    if config.from_address.is_empty() {
        return Err(ClubError::Config(
            "Mail sender address is required".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(ClubError::Config(
            "Mail timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate admin credentials
fn validate_admin_config(config: &super::AdminConfig) -> Result<()> {
    if config.username.is_empty() || config.password.is_empty() {
        return Err(ClubError::Config(
            "Admin username and password are required".to_string()
        ));
    }

    if config.token_ttl_seconds == 0 {
        return Err(ClubError::Config(
            "Admin token TTL must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(ClubError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(ClubError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
