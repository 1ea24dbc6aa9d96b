//! Mail transport that records instead of sending

use async_trait::async_trait;
use parking_lot::Mutex;
use ClubPortal::services::{MailTransport, OutgoingMail};
use ClubPortal::{ClubError, Result};

#[derive(Default)]
pub struct RecordingMailTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl RecordingMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose every delivery fails
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.to.eq_ignore_ascii_case(address))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        if self.fail {
            return Err(ClubError::Mail("smtp unavailable".to_string()));
        }
        self.sent.lock().push(mail.clone());
        Ok(())
    }
}
