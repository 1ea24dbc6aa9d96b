//! Notification service implementation
//!
//! Confirmation mail for registrations: HTML body with the credential and an
//! inline QR image, delivered over SMTP. Delivery problems are logged and
//! reported as `false`, never as an error of the registration itself.

use std::sync::Arc;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};
use crate::config::settings::{ClubConfig, Settings};
use crate::models::Participant;
use crate::utils::errors::{ClubError, Result};
use crate::utils::helpers::escape_html;

/// Content id the HTML body uses for the QR image
pub const QR_CONTENT_ID: &str = "qrcode";

/// One outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub inline_png: Option<Vec<u8>>,
}

/// Delivery backend
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()>;
}

/// SMTP delivery through lettre
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mail = &settings.mail;
        let from = Mailbox::new(
            Some(mail.from_name.clone()),
            mail.from_address
                .parse()
                .map_err(|e| ClubError::Config(format!("Invalid mail from address: {}", e)))?,
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.smtp_host)
            .map_err(|e| ClubError::Config(format!("Invalid SMTP relay: {}", e)))?
            .port(mail.smtp_port)
            .credentials(Credentials::new(mail.username.clone(), mail.password.clone()))
            .timeout(Some(settings.mail_timeout()))
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| ClubError::Mail(format!("Invalid recipient: {}", e)))?;

        let mut body = MultiPart::related().singlepart(SinglePart::html(mail.html.clone()));
        if let Some(png) = &mail.inline_png {
            let content_type = ContentType::parse("image/png")
                .map_err(|e| ClubError::Mail(e.to_string()))?;
            body = body.singlepart(
                Attachment::new_inline(QR_CONTENT_ID.to_string()).body(png.clone(), content_type),
            );
        }

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .multipart(body)
            .map_err(|e| ClubError::Mail(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        let message = self.build_message(mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| ClubError::Mail(e.to_string()))?;
        Ok(())
    }
}

/// What the confirmation mail says
#[derive(Debug, Clone)]
pub struct Confirmation<'a> {
    pub to: &'a str,
    pub event_name: &'a str,
    pub credential: &'a str,
    pub participants: &'a [Participant],
    pub qr_png: Option<Vec<u8>>,
}

/// Notification service for registration mail
#[derive(Clone)]
pub struct NotificationService {
    transport: Option<Arc<dyn MailTransport>>,
    club: ClubConfig,
}

impl NotificationService {
    /// SMTP-backed service; no transport when mail is disabled
    pub fn new(settings: &Settings) -> Result<Self> {
        let transport: Option<Arc<dyn MailTransport>> = if settings.features.email_notifications {
            Some(Arc::new(SmtpMailTransport::new(settings)?))
        } else {
            None
        };
        Ok(Self {
            transport,
            club: settings.club.clone(),
        })
    }

    /// Service delivering through a caller-supplied transport
    pub fn with_transport(settings: &Settings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            transport: Some(transport),
            club: settings.club.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the registration confirmation; `true` when delivered
    pub async fn send_confirmation(&self, confirmation: Confirmation<'_>) -> bool {
        let Some(transport) = &self.transport else {
            debug!(to = %confirmation.to, "Mail disabled, skipping confirmation");
            return false;
        };

        let mail = OutgoingMail {
            to: confirmation.to.to_string(),
            subject: format!("Registration Confirmation - {}", confirmation.event_name),
            html: confirmation_html(&self.club, &confirmation),
            inline_png: confirmation.qr_png.clone(),
        };

        match transport.deliver(&mail).await {
            Ok(()) => {
                info!(to = %mail.to, credential = %confirmation.credential, "Confirmation mail sent");
                true
            }
            Err(e) => {
                warn!(to = %mail.to, credential = %confirmation.credential, error = %e, "Confirmation mail failed");
                false
            }
        }
    }
}

/// HTML body; every user-supplied value is escaped
pub fn confirmation_html(club: &ClubConfig, confirmation: &Confirmation<'_>) -> String {
    let mut roster = String::new();
    if !confirmation.participants.is_empty() {
        roster.push_str("<h3>Participants</h3><ul>");
        for p in confirmation.participants {
            roster.push_str(&format!(
                "<li>{} ({}) - {}</li>",
                escape_html(&p.name),
                escape_html(&p.roll_no),
                escape_html(&p.email)
            ));
        }
        roster.push_str("</ul>");
    }

    let qr = if confirmation.qr_png.is_some() {
        format!(
            "<p>Show this QR code at the entrance:</p><p><img src=\"cid:{}\" alt=\"Registration QR code\" width=\"240\" height=\"240\"/></p>",
            QR_CONTENT_ID
        )
    } else {
        String::new()
    };

    format!(
        "<html><body style=\"font-family: Arial, sans-serif;\">\
         <h2>Registration Confirmed</h2>\
         <p>Thank you for registering for <strong>{event}</strong>.</p>\
         <p>Your registration ID: <strong>{credential}</strong></p>\
         {roster}{qr}\
         <hr/><p>{club}<br/>{college}</p>\
         </body></html>",
        event = escape_html(confirmation.event_name),
        credential = escape_html(confirmation.credential),
        roster = roster,
        qr = qr,
        club = escape_html(&club.name),
        college = escape_html(&club.college),
    )
}
