//! Registration record and submission models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use super::lenient;

/// Keys owned by the server; never accepted from a submission's free-form fields
pub const RESERVED_KEYS: &[&str] = &[
    "id",
    "registration_id",
    "submitter_email",
    "event_id",
    "template_id",
    "participants",
    "num_participants",
    "timestamp",
    "payment_status",
    "attendance_status",
    "entry_time",
    "marked_by",
    "attendance_comment",
    "participant_attendance",
    "payment_amount",
    "payment_id",
    "payment_order_id",
    "payment_completed_at",
    "payment_failed_at",
    "payment_verified_server_side",
    "webhook_verified",
    "qr_code",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    NotRequired,
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    NotEntered,
    PartiallyPresent,
    Entered,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::NotEntered => "not_entered",
            AttendanceStatus::PartiallyPresent => "partially_present",
            AttendanceStatus::Entered => "entered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub roll_no: String,
    pub email: String,
}

/// One persisted registration; custom field values live in `fields`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Sequential id within the event's record file
    #[serde(default)]
    pub id: u64,
    /// Credential: QR payload, payment correlation and attendance lookup key
    #[serde(default)]
    pub registration_id: String,
    #[serde(default)]
    pub submitter_email: String,
    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<Participant>,
    #[serde(default, deserialize_with = "lenient::opt_u32", skip_serializing_if = "Option::is_none")]
    pub num_participants: Option<u32>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub attendance_status: AttendanceStatus,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub marked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant_attendance: Vec<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_failed_at: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub payment_verified_server_side: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub webhook_verified: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Registration {
    /// Case-insensitive submitter email match
    pub fn matches_email(&self, email: &str) -> bool {
        self.submitter_email.trim().eq_ignore_ascii_case(email.trim())
    }

    /// Credential and submitter email must both match
    pub fn matches_credential(&self, credential: &str, email: &str) -> bool {
        !credential.is_empty() && self.registration_id == credential && self.matches_email(email)
    }

    /// Free-form field rendered as a trimmed string
    pub fn field_str(&self, name: &str) -> Option<String> {
        field_as_string(&self.fields, name)
    }

    /// Name shown to door staff: team lead, then `name` field, then email
    pub fn display_name(&self) -> String {
        self.participants
            .first()
            .map(|p| p.name.clone())
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.field_str("name"))
            .unwrap_or_else(|| self.submitter_email.clone())
    }

    pub fn is_marked(&self) -> bool {
        self.attendance_status != AttendanceStatus::NotEntered || self.entry_time.is_some()
    }

    /// Rebuild the submission this record was produced from, for re-validation
    pub fn to_submission(&self) -> Submission {
        let mut fields = self.fields.clone();
        for (i, p) in self.participants.iter().enumerate() {
            let n = i + 1;
            fields.insert(format!("participant_{}_name", n), Value::from(p.name.clone()));
            fields.insert(format!("participant_{}_roll", n), Value::from(p.roll_no.clone()));
            fields.insert(format!("participant_{}_email", n), Value::from(p.email.clone()));
        }
        Submission {
            submitter_email: self.submitter_email.clone(),
            event_id: self.event_id,
            template_id: self.template_id,
            num_participants: self.num_participants,
            fields,
        }
    }
}

/// Raw public submission: typed envelope keys plus schema-driven fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub submitter_email: String,
    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_u32", skip_serializing_if = "Option::is_none")]
    pub num_participants: Option<u32>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Submission {
    /// Field value as a trimmed string; numbers and booleans are stringified
    pub fn field_str(&self, name: &str) -> Option<String> {
        if name == "submitter_email" {
            let email = self.submitter_email.trim();
            return (!email.is_empty()).then(|| email.to_string());
        }
        field_as_string(&self.fields, name)
    }
}

fn field_as_string(fields: &Map<String, Value>, name: &str) -> Option<String> {
    let raw = match fields.get(name)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

/// True for `participant_{n}_{name|roll|email}` roster keys
pub fn is_participant_key(key: &str) -> bool {
    key.strip_prefix("participant_")
        .and_then(|rest| rest.split_once('_'))
        .map_or(false, |(n, field)| {
            n.parse::<u32>().is_ok() && matches!(field, "name" | "roll" | "email")
        })
}
