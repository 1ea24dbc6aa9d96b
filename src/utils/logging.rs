//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the ClubPortal application.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};
use crate::config::LoggingConfig;
use crate::utils::errors::{ClubError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize logging based on configuration
///
/// The returned guard flushes the file appender on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| ClubError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let mut layers: Vec<BoxedLayer> = vec![filter.boxed()];

    if config.json {
        layers.push(tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed());
    } else {
        layers.push(tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed());
    }

    let guard = match &config.file_path {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "clubportal.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| ClubError::Config(format!("Failed to install logger: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log registration workflow actions with structured data
pub fn log_registration_action(event_id: Option<i64>, credential: &str, operation: &str, details: Option<&str>) {
    info!(
        event_id = event_id,
        credential = credential,
        operation = operation,
        details = details,
        "Registration action performed"
    );
}

/// Log payment gateway events
pub fn log_payment_event(order_id: &str, payment_id: Option<&str>, operation: &str, success: bool) {
    if success {
        info!(
            order_id = order_id,
            payment_id = payment_id,
            operation = operation,
            "Payment event processed"
        );
    } else {
        warn!(
            order_id = order_id,
            payment_id = payment_id,
            operation = operation,
            "Payment event rejected"
        );
    }
}

/// Log attendance marks
pub fn log_attendance_mark(event_id: i64, credential: &str, status: &str, marked_by: &str) {
    info!(
        event_id = event_id,
        credential = credential,
        status = status,
        marked_by = marked_by,
        "Attendance marked"
    );
}

/// Log admin actions
pub fn log_admin_action(admin: &str, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin = admin,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log storage failures with full server-side context
pub fn log_storage_failure(operation: &str, path: &std::path::Path, error: &str) {
    error!(
        operation = operation,
        path = %path.display(),
        error = error,
        "Storage operation failed"
    );
}

/// Log record store operations
pub fn log_store_operation(operation: &str, file: &str, duration_ms: u64, records: usize) {
    debug!(
        operation = operation,
        file = file,
        duration_ms = duration_ms,
        records = records,
        "Record store operation completed"
    );
}
