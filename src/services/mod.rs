//! Services module
//!
//! This module contains business logic services

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod notification;
pub mod payment;
pub mod qr;
pub mod registration;
pub mod validator;

// Re-export commonly used services
pub use admin::{AdminService, EventRegistrations};
pub use attendance::{AttendanceMark, AttendanceService};
pub use auth::AuthService;
pub use notification::{MailTransport, NotificationService, OutgoingMail};
pub use payment::{PaymentGateway, OrderStatus};
pub use qr::QrService;
pub use registration::{PaymentVerification, RegistrationOutcome, RegistrationReceipt, RegistrationService};
pub use validator::{FormValidator, ValidatedSubmission};

use std::sync::Arc;
use std::time::Duration;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::state::sessions::AdminSessionStore;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub registration_service: RegistrationService,
    pub attendance_service: AttendanceService,
    pub admin_service: AdminService,
    pub auth_service: AuthService,
    pub notification_service: NotificationService,
    pub payment_gateway: Option<PaymentGateway>,
    pub qr_service: QrService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, db: DatabaseService) -> Result<Self> {
        let notification_service = NotificationService::new(settings)?;
        Self::assemble(settings, db, notification_service)
    }

    /// Same as `new` but delivering mail through `transport`
    pub fn with_mail_transport(
        settings: &Settings,
        db: DatabaseService,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self> {
        let notification_service = NotificationService::with_transport(settings, transport);
        Self::assemble(settings, db, notification_service)
    }

    fn assemble(settings: &Settings, db: DatabaseService, notification_service: NotificationService) -> Result<Self> {
        let payment_gateway = if settings.features.payments {
            Some(PaymentGateway::new(settings)?)
        } else {
            None
        };
        let qr_service = QrService::new(settings);
        let sessions = AdminSessionStore::new(Duration::from_secs(settings.admin.token_ttl_seconds));

        Ok(Self {
            registration_service: RegistrationService::new(
                settings,
                db.clone(),
                payment_gateway.clone(),
                notification_service.clone(),
                qr_service.clone(),
            ),
            attendance_service: AttendanceService::new(settings, db.clone()),
            admin_service: AdminService::new(db),
            auth_service: AuthService::new(settings, sessions),
            notification_service,
            payment_gateway,
            qr_service,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let payment_gateway_reachable = match &self.payment_gateway {
            Some(gateway) => Some(gateway.health_check().await),
            None => None,
        };

        ServiceHealthStatus {
            payment_gateway_reachable,
            email_enabled: self.notification_service.is_enabled(),
            qr_enabled: self.qr_service.is_enabled(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    /// `None` when payments are disabled
    pub payment_gateway_reachable: Option<bool>,
    pub email_enabled: bool,
    pub qr_enabled: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.payment_gateway_reachable != Some(false)
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.payment_gateway_reachable == Some(false) {
            issues.push("Payment gateway unreachable".to_string());
        }

        issues
    }
}
