//! Form template model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_one() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_field_type() -> String {
    "text".to_string()
}

/// Admin-defined schema a registration submission is validated against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormTemplate {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_one")]
    pub min_participants: u32,
    #[serde(default = "default_one")]
    pub max_participants: u32,
    #[serde(default)]
    pub custom_fields: Vec<FieldDefinition>,
    /// Older field list, still honoured for required and email checks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDefinition>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub payment_enabled: bool,
    #[serde(default)]
    pub payment_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDefinition {
    /// Label shown to users, falling back to the field name
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.name)
    }

    pub fn is_email(&self) -> bool {
        self.field_type.eq_ignore_ascii_case("email")
    }
}

impl FormTemplate {
    /// Current and legacy field definitions, in that order
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.custom_fields.iter().chain(self.fields.iter())
    }

    pub fn requires_payment(&self) -> bool {
        self.payment_enabled && self.payment_amount > 0.0
    }

    /// Team forms collect a per-participant roster
    pub fn is_participant_based(&self) -> bool {
        self.max_participants > 1
    }

    /// Payment amount in the gateway's minor unit (paise)
    pub fn amount_minor_units(&self) -> u64 {
        to_minor_units(self.payment_amount)
    }

    /// Schema-declared unique email fields besides the submitter email
    pub fn unique_email_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.all_fields()
            .filter(|f| f.is_email() && f.unique && f.name != "submitter_email")
    }
}

/// Convert a major-unit amount to minor units, rounding half away from zero
pub fn to_minor_units(amount: f64) -> u64 {
    if amount <= 0.0 || !amount.is_finite() {
        return 0;
    }
    (amount * 100.0).round() as u64
}
