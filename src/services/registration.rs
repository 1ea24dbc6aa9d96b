//! Registration workflow
//!
//! Takes a public submission from validation to a committed record. Free
//! registrations are appended immediately; paid ones create a gateway order
//! and are only appended once the payment has been verified server-side.
//! The credential is generated before anything is stored or sent so the
//! record, the QR image and the confirmation mail always agree.

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::config::settings::Settings;
use crate::database::{AppendOutcome, DatabaseService};
use crate::models::{Event, FormTemplate, PaymentStatus, Registration, Submission};
use crate::services::notification::{Confirmation, NotificationService};
use crate::services::payment::{CustomerInfo, OrderStatus, PaymentGateway};
use crate::services::qr::QrService;
use crate::services::validator::{FormValidator, ValidatedSubmission};
use crate::utils::errors::{ClubError, PaymentError, Result, ValidationError};
use crate::utils::helpers::{generate_uuid, order_receipt};
use crate::utils::logging::{log_payment_event, log_registration_action};

const PAYMENT_REUSED: &str = "Payment already processed";
const CREDENTIAL_REUSED: &str = "Registration id already in use";

/// Committed registration as reported back to the registrant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReceipt {
    pub registration_id: String,
    pub email_sent: bool,
    /// Base64 PNG of the verification QR code
    pub qr_code: Option<String>,
}

/// Order awaiting payment; nothing has been stored yet
#[derive(Debug, Clone)]
pub struct PendingPayment {
    pub order_id: String,
    /// Minor units
    pub amount: u64,
    pub currency: String,
    pub key_id: String,
    /// Normalized payload the client echoes back on verification
    pub registration: Registration,
    pub registration_file: String,
}

#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Registered(RegistrationReceipt),
    PaymentRequired(PendingPayment),
}

/// Client's proof of payment plus the echoed payload
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerification {
    #[serde(rename = "razorpay_payment_id", default)]
    pub payment_id: String,
    #[serde(rename = "razorpay_order_id", default)]
    pub order_id: String,
    #[serde(rename = "razorpay_signature", default)]
    pub signature: String,
    pub registration_data: Registration,
    #[serde(default)]
    pub registration_file: String,
}

/// What a webhook delivery changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub event: String,
    /// Credential of the updated registration, if one matched
    pub updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    payment: Option<WebhookPayment>,
}

#[derive(Debug, Deserialize)]
struct WebhookPayment {
    entity: WebhookPaymentEntity,
}

#[derive(Debug, Deserialize)]
struct WebhookPaymentEntity {
    id: String,
    #[serde(default)]
    order_id: Option<String>,
}

/// Registration workflow service
#[derive(Clone)]
pub struct RegistrationService {
    db: DatabaseService,
    validator: FormValidator,
    payments: Option<PaymentGateway>,
    notifications: NotificationService,
    qr: QrService,
    offset: FixedOffset,
}

impl RegistrationService {
    pub fn new(
        settings: &Settings,
        db: DatabaseService,
        payments: Option<PaymentGateway>,
        notifications: NotificationService,
        qr: QrService,
    ) -> Self {
        Self {
            db,
            validator: FormValidator::new(settings.registration.allowed_email_domains.clone()),
            payments,
            notifications,
            qr,
            offset: settings.local_offset(),
        }
    }

    /// Today in the deployment's civil time zone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    fn now(&self) -> String {
        Utc::now().with_timezone(&self.offset).to_rfc3339()
    }

    pub async fn register(&self, event_slug: &str, submission: Submission) -> Result<RegistrationOutcome> {
        self.register_at(event_slug, submission, self.today()).await
    }

    /// Submit a registration as of `today`
    pub async fn register_at(
        &self,
        event_slug: &str,
        submission: Submission,
        today: NaiveDate,
    ) -> Result<RegistrationOutcome> {
        let event = self.resolve_event(event_slug, submission.event_id).await?;
        ensure_open(&event, today)?;
        let template = self.resolve_template(&event, submission.template_id).await?;

        let validated = self.validator.validate(&submission, template.as_ref())?;
        let registration_file = self.db.events.bind_registration_file(event.id).await?;

        let credential = generate_uuid();
        let mut registration = build_record(&credential, &event, template.as_ref(), validated, self.now());

        match template.as_ref().filter(|t| t.requires_payment()) {
            Some(template) => {
                let pending = self
                    .create_payment_order(&event, template, registration, registration_file)
                    .await?;
                Ok(RegistrationOutcome::PaymentRequired(pending))
            }
            None => {
                registration.payment_status = PaymentStatus::NotRequired;
                let receipt = self.commit(&event, template.as_ref(), &registration_file, registration).await?;
                Ok(RegistrationOutcome::Registered(receipt))
            }
        }
    }

    /// Second phase of a paid registration
    pub async fn verify_payment(&self, verification: PaymentVerification) -> Result<RegistrationReceipt> {
        let gateway = self.gateway()?;
        let data = verification.registration_data;

        let event_id = data
            .event_id
            .ok_or_else(|| ClubError::InvalidInput("Missing event id".to_string()))?;
        let event = self
            .db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| ClubError::NotFound("Event not found".to_string()))?;

        let registration_file = self.db.events.registration_file_of(event.id).await?;
        if verification.registration_file.rsplit('/').next() != Some(registration_file.as_str()) {
            return Err(ClubError::InvalidInput("Invalid registration file".to_string()));
        }

        let template = self
            .resolve_template(&event, data.template_id)
            .await?
            .filter(|t| t.requires_payment())
            .ok_or_else(|| ClubError::InvalidInput("Payment is not required for this event".to_string()))?;

        if Uuid::parse_str(&data.registration_id).is_err() {
            return Err(ClubError::InvalidInput("Invalid registration id".to_string()));
        }
        if let Some(order_id) = &data.payment_order_id {
            if order_id != &verification.order_id {
                return Err(PaymentError::OrderMismatch.into());
            }
        }

        let validated = self.validator.validate(&data.to_submission(), Some(&template))?;

        if let Err(e) = gateway
            .verify_payment(
                &verification.payment_id,
                &verification.order_id,
                &verification.signature,
                template.amount_minor_units(),
            )
            .await
        {
            log_payment_event(&verification.order_id, Some(&verification.payment_id), "verify", false);
            return Err(e.into());
        }
        log_payment_event(&verification.order_id, Some(&verification.payment_id), "verify", true);
        let registration_file = self.db.events.bind_registration_file(event.id).await?;

        let timestamp = if data.timestamp.trim().is_empty() { self.now() } else { data.timestamp.clone() };
        let mut registration = build_record(&data.registration_id, &event, Some(&template), validated, timestamp);
        registration.payment_status = PaymentStatus::Completed;
        registration.payment_amount = Some(template.payment_amount);
        registration.payment_id = Some(verification.payment_id.clone());
        registration.payment_order_id = Some(verification.order_id.clone());
        registration.payment_completed_at = Some(self.now());
        registration.payment_verified_server_side = true;

        self.commit(&event, Some(&template), &registration_file, registration).await
    }

    /// Apply an authenticated gateway notification
    pub async fn handle_webhook(&self, body: &[u8], signature: &str) -> Result<WebhookOutcome> {
        let gateway = self.gateway()?;
        gateway.verify_webhook_signature(body, signature)?;

        let envelope: WebhookEnvelope = serde_json::from_slice(body)
            .map_err(|e| ClubError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;
        let entity = match envelope.payload.payment {
            Some(payment) => payment.entity,
            None => {
                debug!(event = %envelope.event, "Webhook without payment entity ignored");
                return Ok(WebhookOutcome { event: envelope.event, updated: None });
            }
        };
        let Some(order_id) = entity.order_id.clone() else {
            return Ok(WebhookOutcome { event: envelope.event, updated: None });
        };

        let now = self.now();
        let payment_id = entity.id.clone();
        let updated = match envelope.event.as_str() {
            "payment.captured" => {
                self.db
                    .registrations
                    .update_by_order(&order_id, move |r| {
                        r.payment_status = PaymentStatus::Completed;
                        r.payment_id = Some(payment_id.clone());
                        r.payment_completed_at = Some(now.clone());
                        r.webhook_verified = true;
                    })
                    .await?
            }
            "payment.failed" => {
                self.db
                    .registrations
                    .update_by_order(&order_id, move |r| {
                        r.payment_status = PaymentStatus::Failed;
                        r.payment_failed_at = Some(now.clone());
                    })
                    .await?
            }
            other => {
                debug!(event = %other, "Unhandled webhook event");
                None
            }
        };

        log_payment_event(&order_id, Some(&entity.id), &envelope.event, updated.is_some());
        Ok(WebhookOutcome { event: envelope.event, updated })
    }

    /// Remote state of an order
    pub async fn order_status(&self, order_id: &str) -> Result<OrderStatus> {
        Ok(self.gateway()?.order_status(order_id).await?)
    }

    fn gateway(&self) -> Result<&PaymentGateway> {
        self.payments
            .as_ref()
            .ok_or_else(|| ClubError::Config("Payments are disabled".to_string()))
    }

    async fn resolve_event(&self, slug: &str, event_id: Option<i64>) -> Result<Event> {
        let by_id = match event_id {
            Some(id) => self.db.events.find_by_id(id).await?,
            None => None,
        };
        let event = match by_id {
            Some(event) => Some(event),
            None => self.db.events.find_by_slug(slug).await?,
        };
        event.ok_or_else(|| ClubError::NotFound("Event not found".to_string()))
    }

    async fn resolve_template(&self, event: &Event, requested: Option<i64>) -> Result<Option<FormTemplate>> {
        if requested.is_some() && requested != event.template_id {
            return Err(ValidationError::TemplateMismatch.into());
        }
        match event.template_id {
            Some(id) => {
                let template = self.db.form_templates.find_by_id(id).await?;
                template
                    .map(Some)
                    .ok_or_else(|| ClubError::NotFound("Form template not found".to_string()))
            }
            None => Ok(None),
        }
    }

    async fn create_payment_order(
        &self,
        event: &Event,
        template: &FormTemplate,
        mut registration: Registration,
        registration_file: String,
    ) -> Result<PendingPayment> {
        let gateway = self
            .payments
            .as_ref()
            .ok_or_else(|| ClubError::RegistrationClosed("Online payment is currently unavailable".to_string()))?;

        let customer = customer_info(&registration)?;
        let amount = template.amount_minor_units();
        let receipt = order_receipt(&event.slug(), &registration.registration_id, Utc::now().timestamp());

        let order = gateway.create_order(&receipt, amount, &customer).await.map_err(|e| {
            warn!(event_id = event.id, credential = %registration.registration_id, error = %e, "Order creation failed");
            ClubError::from(e)
        })?;

        registration.payment_status = PaymentStatus::Pending;
        registration.payment_amount = Some(template.payment_amount);
        registration.payment_order_id = Some(order.order_id.clone());

        log_registration_action(Some(event.id), &registration.registration_id, "payment_order_created", Some(&order.order_id));

        Ok(PendingPayment {
            order_id: order.order_id,
            amount: order.amount,
            currency: order.currency,
            key_id: gateway.key_id().to_string(),
            registration,
            registration_file,
        })
    }

    /// Append under the file lock, then send the confirmation
    async fn commit(
        &self,
        event: &Event,
        template: Option<&FormTemplate>,
        registration_file: &str,
        registration: Registration,
    ) -> Result<RegistrationReceipt> {
        let credential = registration.registration_id.clone();
        let email = registration.submitter_email.clone();
        let participants = registration.participants.clone();
        let payment_id = registration.payment_id.clone();

        let unique_fields: Vec<(String, String)> = template
            .map(|t| {
                t.unique_email_fields()
                    .map(|f| (f.name.clone(), f.display_label().to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let outcome = self
            .db
            .registrations
            .append(registration_file, registration, move |existing, new| {
                find_duplicate(existing, new, &unique_fields)
            })
            .await?;

        match outcome {
            AppendOutcome::Appended(records) => {
                log_registration_action(Some(event.id), &credential, "registered", Some(registration_file));
                debug!(records = records.len(), "Registration file updated");
            }
            AppendOutcome::Rejected { message, records } => {
                info!(event_id = event.id, credential = %credential, reason = %message, "Duplicate registration rejected");
                let registration_id = if message == PAYMENT_REUSED {
                    records
                        .iter()
                        .find(|r| r.payment_id.is_some() && r.payment_id == payment_id)
                        .map(|r| r.registration_id.clone())
                } else {
                    None
                };
                return Err(ClubError::Conflict { message, registration_id });
            }
        }

        let qr = self.qr.credential_qr(Some(event.id), &credential, &email);
        let email_sent = self
            .notifications
            .send_confirmation(Confirmation {
                to: &email,
                event_name: &event.name,
                credential: &credential,
                participants: &participants,
                qr_png: qr.as_ref().map(|q| q.png.clone()),
            })
            .await;

        Ok(RegistrationReceipt {
            registration_id: credential,
            email_sent,
            qr_code: qr.map(|q| q.to_base64()),
        })
    }
}

fn ensure_open(event: &Event, today: NaiveDate) -> Result<()> {
    if !event.accepts_internal_registration() {
        return Err(ClubError::RegistrationClosed("Registration is not enabled for this event".to_string()));
    }
    if !event.allow_registration {
        return Err(ClubError::RegistrationClosed("Registration is currently closed for this event".to_string()));
    }
    if let Some(deadline) = &event.registration_deadline {
        if !deadline.is_open_on(today) {
            return Err(ClubError::RegistrationClosed("Registration deadline has passed".to_string()));
        }
    }
    Ok(())
}

fn build_record(
    credential: &str,
    event: &Event,
    template: Option<&FormTemplate>,
    validated: ValidatedSubmission,
    timestamp: String,
) -> Registration {
    Registration {
        id: 0,
        registration_id: credential.to_string(),
        submitter_email: validated.submitter_email,
        event_id: Some(event.id),
        template_id: template.map(|t| t.id),
        participants: validated.participants,
        num_participants: validated.num_participants,
        timestamp,
        payment_status: PaymentStatus::NotRequired,
        attendance_status: Default::default(),
        entry_time: None,
        marked_by: None,
        attendance_comment: None,
        participant_attendance: Vec::new(),
        payment_amount: None,
        payment_id: None,
        payment_order_id: None,
        payment_completed_at: None,
        payment_failed_at: None,
        payment_verified_server_side: false,
        webhook_verified: false,
        fields: validated.fields,
    }
}

fn customer_info(registration: &Registration) -> Result<CustomerInfo> {
    let phone = registration
        .field_str("phone")
        .or_else(|| registration.field_str("team_leader_phone"))
        .ok_or(ValidationError::PhoneRequired)?;

    let name = registration
        .field_str("name")
        .or_else(|| registration.field_str("team_leader_name"))
        .or_else(|| registration.participants.first().map(|p| p.name.clone()))
        .unwrap_or_else(|| "Guest".to_string());

    let email = registration
        .field_str("email")
        .or_else(|| registration.field_str("team_leader_email"))
        .unwrap_or_else(|| registration.submitter_email.clone());

    Ok(CustomerInfo { name, email, phone })
}

/// Conflict message when `new` duplicates a stored registration
fn find_duplicate(existing: &[Registration], new: &Registration, unique_fields: &[(String, String)]) -> Option<String> {
    if let Some(payment_id) = &new.payment_id {
        if existing.iter().any(|r| r.payment_id.as_ref() == Some(payment_id)) {
            return Some(PAYMENT_REUSED.to_string());
        }
    }

    if !new.registration_id.is_empty() && existing.iter().any(|r| r.registration_id == new.registration_id) {
        return Some(CREDENTIAL_REUSED.to_string());
    }

    if existing.iter().any(|r| r.matches_email(&new.submitter_email)) {
        return Some(format!("Email already registered: {}", new.submitter_email));
    }

    for (name, label) in unique_fields {
        let Some(value) = new.field_str(name) else { continue };
        if existing
            .iter()
            .any(|r| r.field_str(name).map_or(false, |v| v.eq_ignore_ascii_case(&value)))
        {
            return Some(format!("{} already registered: {}", label, value));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(json: &str) -> Registration {
        serde_json::from_str(json).unwrap()
    }

    fn event(json: &str) -> Event {
        serde_json::from_str(json).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_deadline_day_is_inclusive() {
        let e = event(r#"{"id": 1, "registration_type": "internal", "registration_deadline": {"date": "2025-01-10"}}"#);
        assert!(ensure_open(&e, ymd(2025, 1, 10)).is_ok());
        assert!(matches!(
            ensure_open(&e, ymd(2025, 1, 11)),
            Err(ClubError::RegistrationClosed(m)) if m == "Registration deadline has passed"
        ));

        let tba = event(r#"{"id": 1, "registration_type": "internal", "registration_deadline": {"date": "TBA"}}"#);
        assert!(ensure_open(&tba, ymd(2099, 1, 1)).is_ok());
    }

    #[test]
    fn test_closed_events() {
        let external = event(r#"{"id": 1, "registration_type": "external"}"#);
        assert!(matches!(
            ensure_open(&external, ymd(2025, 1, 1)),
            Err(ClubError::RegistrationClosed(m)) if m == "Registration is not enabled for this event"
        ));

        let gated = event(r#"{"id": 1, "registration_type": "internal", "allow_registration": false}"#);
        assert!(matches!(
            ensure_open(&gated, ymd(2025, 1, 1)),
            Err(ClubError::RegistrationClosed(m)) if m == "Registration is currently closed for this event"
        ));
    }

    #[test]
    fn test_duplicate_email_is_case_insensitive() {
        let existing = vec![registration(r#"{"registration_id": "r1", "submitter_email": "A@kongu.edu"}"#)];
        let new = registration(r#"{"registration_id": "r2", "submitter_email": "a@kongu.edu"}"#);
        assert_eq!(
            find_duplicate(&existing, &new, &[]).as_deref(),
            Some("Email already registered: a@kongu.edu")
        );
    }

    #[test]
    fn test_duplicate_unique_field() {
        let existing = vec![registration(r#"{"submitter_email": "a@kongu.edu", "mentor": "m@kongu.edu"}"#)];
        let new = registration(r#"{"submitter_email": "b@kongu.edu", "mentor": "M@kongu.edu"}"#);
        let unique = vec![("mentor".to_string(), "Mentor email".to_string())];
        assert_eq!(
            find_duplicate(&existing, &new, &unique).as_deref(),
            Some("Mentor email already registered: M@kongu.edu")
        );
        assert!(find_duplicate(&existing, &new, &[]).is_none());
    }

    #[test]
    fn test_payment_reuse_reported_first() {
        let existing = vec![registration(r#"{"submitter_email": "a@kongu.edu", "payment_id": "pay_1"}"#)];
        let new = registration(r#"{"submitter_email": "a@kongu.edu", "payment_id": "pay_1"}"#);
        assert_eq!(find_duplicate(&existing, &new, &[]).as_deref(), Some(PAYMENT_REUSED));
    }

    #[test]
    fn test_reused_credential_is_rejected() {
        let existing = vec![registration(r#"{"registration_id": "r1", "submitter_email": "a@kongu.edu"}"#)];
        let new = registration(r#"{"registration_id": "r1", "submitter_email": "b@kongu.edu"}"#);
        assert_eq!(find_duplicate(&existing, &new, &[]).as_deref(), Some(CREDENTIAL_REUSED));
    }

    #[test]
    fn test_customer_info_fallbacks() {
        let reg = registration(r#"{"submitter_email": "a@kongu.edu", "team_leader_phone": "98400"}"#);
        let customer = customer_info(&reg).unwrap();
        assert_eq!(customer.name, "Guest");
        assert_eq!(customer.email, "a@kongu.edu");
        assert_eq!(customer.phone, "98400");

        let reg = registration(r#"{"submitter_email": "a@kongu.edu", "name": "Asha", "email": "asha@gmail.com", "phone": "1"}"#);
        let customer = customer_info(&reg).unwrap();
        assert_eq!(customer.name, "Asha");
        assert_eq!(customer.email, "asha@gmail.com");
    }

    #[test]
    fn test_phone_required_for_payment() {
        let reg = registration(r#"{"submitter_email": "a@kongu.edu"}"#);
        assert!(matches!(
            customer_info(&reg),
            Err(ClubError::Validation(ValidationError::PhoneRequired))
        ));
    }
}
