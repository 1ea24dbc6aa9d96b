//! Form template validator
//!
//! Checks a raw submission against an admin-defined template and produces the
//! normalized payload the registration workflow stores. Checks run in a fixed
//! order and the first failing step wins:
//!
//! 1. submitter email (presence, shape, domain allow-list)
//! 2. participant roster for team templates, first failing slot reported
//! 3. required fields, every missing label reported together
//! 4. email-typed fields

use serde_json::{Map, Value};
use crate::models::registration::{is_participant_key, RESERVED_KEYS};
use crate::models::{FormTemplate, Participant, Submission};
use crate::utils::errors::ValidationError;
use crate::utils::helpers::{is_allowed_domain, is_blank, is_valid_email};

/// Submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub submitter_email: String,
    pub participants: Vec<Participant>,
    pub num_participants: Option<u32>,
    /// Free-form field values with server-owned and roster keys removed
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct FormValidator {
    allowed_domains: Vec<String>,
}

impl FormValidator {
    pub fn new(allowed_domains: Vec<String>) -> Self {
        Self { allowed_domains }
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Validate `submission`; without a template only the submitter email is checked
    pub fn validate(
        &self,
        submission: &Submission,
        template: Option<&FormTemplate>,
    ) -> Result<ValidatedSubmission, ValidationError> {
        let submitter_email = submission.submitter_email.trim().to_string();
        if submitter_email.is_empty() {
            return Err(ValidationError::MissingSubmitterEmail);
        }
        if !is_valid_email(&submitter_email) {
            return Err(ValidationError::InvalidEmail);
        }
        self.check_domain(&submitter_email)?;

        let mut participants = Vec::new();
        let mut num_participants = None;

        if let Some(template) = template {
            if !template.active {
                return Err(ValidationError::TemplateInactive);
            }

            if template.is_participant_based() {
                let count = submission.num_participants.unwrap_or(template.min_participants);
                participants = self.collect_participants(submission, template, count)?;
                num_participants = Some(count);
            }

            let missing = missing_required(submission, template);
            if !missing.is_empty() {
                return Err(ValidationError::MissingFields(missing));
            }

            for field in template.all_fields().filter(|f| f.is_email()) {
                if let Some(value) = submission.field_str(&field.name) {
                    if !is_valid_email(&value) {
                        return Err(ValidationError::InvalidFieldEmail {
                            label: field.display_label().to_string(),
                        });
                    }
                    self.check_domain(&value)?;
                }
            }
        }

        let fields = submission
            .fields
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()) && !is_participant_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(ValidatedSubmission {
            submitter_email,
            participants,
            num_participants,
            fields,
        })
    }

    fn check_domain(&self, email: &str) -> Result<(), ValidationError> {
        if is_allowed_domain(email, &self.allowed_domains) {
            Ok(())
        } else {
            Err(ValidationError::DomainNotAllowed {
                allowed: self.allowed_domains.join(", "),
            })
        }
    }

    fn collect_participants(
        &self,
        submission: &Submission,
        template: &FormTemplate,
        count: u32,
    ) -> Result<Vec<Participant>, ValidationError> {
        let (min, max) = (template.min_participants, template.max_participants);
        if count < min || count > max {
            return Err(ValidationError::ParticipantCount { min, max });
        }

        let mut participants = Vec::with_capacity(count as usize);
        for index in 1..=count {
            let problem = |p: &str| ValidationError::Participant { index, problem: p.to_string() };

            let name = submission.field_str(&format!("participant_{}_name", index));
            let roll = submission.field_str(&format!("participant_{}_roll", index));
            let email = submission.field_str(&format!("participant_{}_email", index));

            let name = name.ok_or_else(|| problem("name is required"))?;
            let roll_no = roll.ok_or_else(|| problem("roll number is required"))?;
            let email = email.ok_or_else(|| problem("email is required"))?;

            if !is_valid_email(&email) {
                return Err(problem("has invalid email format"));
            }
            if !is_allowed_domain(&email, &self.allowed_domains) {
                return Err(problem(&format!(
                    "email domain not allowed. Please use one of: {}",
                    self.allowed_domains.join(", ")
                )));
            }

            participants.push(Participant { name, roll_no, email });
        }
        Ok(participants)
    }
}

/// Labels of required fields that are absent or blank, current list first
fn missing_required(submission: &Submission, template: &FormTemplate) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for field in template.all_fields().filter(|f| f.required) {
        let absent = submission.field_str(&field.name).map_or(true, |v| is_blank(&v));
        let label = field.display_label().to_string();
        if absent && !missing.contains(&label) {
            missing.push(label);
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn validator() -> FormValidator {
        FormValidator::new(vec!["kongu.edu".to_string(), "gmail.com".to_string()])
    }

    fn submission(json: &str) -> Submission {
        serde_json::from_str(json).unwrap()
    }

    fn template(json: &str) -> FormTemplate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_submitter_email_checks() {
        let v = validator();
        assert_matches!(v.validate(&submission(r#"{}"#), None), Err(ValidationError::MissingSubmitterEmail));
        assert_matches!(
            v.validate(&submission(r#"{"submitter_email": "not-an-email"}"#), None),
            Err(ValidationError::InvalidEmail)
        );
        assert_matches!(
            v.validate(&submission(r#"{"submitter_email": "a@yahoo.com"}"#), None),
            Err(ValidationError::DomainNotAllowed { allowed }) if allowed == "kongu.edu, gmail.com"
        );
        assert!(v.validate(&submission(r#"{"submitter_email": " a@Kongu.EDU "}"#), None).is_ok());
    }

    #[test]
    fn test_single_form_needs_no_roster() {
        let t = template(r#"{"id": 5}"#);
        let ok = validator().validate(&submission(r#"{"submitter_email": "a@kongu.edu"}"#), Some(&t)).unwrap();
        assert!(ok.participants.is_empty());
        assert_eq!(ok.num_participants, None);
    }

    #[test]
    fn test_inactive_template_rejected() {
        let t = template(r#"{"id": 5, "active": false}"#);
        assert_matches!(
            validator().validate(&submission(r#"{"submitter_email": "a@kongu.edu"}"#), Some(&t)),
            Err(ValidationError::TemplateInactive)
        );
    }

    #[test]
    fn test_participant_count_bounds() {
        let t = template(r#"{"id": 2, "min_participants": 2, "max_participants": 4}"#);
        assert_matches!(
            validator().validate(&submission(r#"{"submitter_email": "a@kongu.edu", "num_participants": 5}"#), Some(&t)),
            Err(ValidationError::ParticipantCount { min: 2, max: 4 })
        );
    }

    #[test]
    fn test_first_failing_participant_reported() {
        let t = template(r#"{"id": 2, "min_participants": 1, "max_participants": 3}"#);
        let s = submission(
            r#"{"submitter_email": "a@kongu.edu", "num_participants": "3",
                "participant_1_name": "A", "participant_1_roll": "1", "participant_1_email": "a@kongu.edu",
                "participant_2_name": "B", "participant_2_roll": "", "participant_2_email": "b@kongu.edu",
                "participant_3_name": "", "participant_3_roll": "3", "participant_3_email": "c@kongu.edu"}"#,
        );
        let err = validator().validate(&s, Some(&t)).unwrap_err();
        assert_eq!(err.to_string(), "Participant 2 roll number is required");
    }

    #[test]
    fn test_participant_domain_checked() {
        let t = template(r#"{"id": 2, "max_participants": 2}"#);
        let s = submission(
            r#"{"submitter_email": "a@kongu.edu",
                "participant_1_name": "A", "participant_1_roll": "1", "participant_1_email": "a@yahoo.com"}"#,
        );
        assert_matches!(
            validator().validate(&s, Some(&t)),
            Err(ValidationError::Participant { index: 1, problem }) if problem.starts_with("email domain not allowed")
        );
    }

    #[test]
    fn test_roster_is_normalized() {
        let t = template(r#"{"id": 2, "max_participants": 2}"#);
        let s = submission(
            r#"{"submitter_email": "a@kongu.edu", "num_participants": 2, "team_name": "Rustaceans",
                "participant_1_name": " A ", "participant_1_roll": "21CS01", "participant_1_email": "a@kongu.edu",
                "participant_2_name": "B", "participant_2_roll": "21CS02", "participant_2_email": "b@gmail.com",
                "registration_id": "forged", "payment_status": "completed"}"#,
        );
        let ok = validator().validate(&s, Some(&t)).unwrap();
        assert_eq!(ok.participants.len(), 2);
        assert_eq!(ok.participants[0].name, "A");
        assert_eq!(ok.num_participants, Some(2));
        assert_eq!(ok.fields.len(), 1);
        assert_eq!(ok.fields.get("team_name"), Some(&Value::from("Rustaceans")));
    }

    #[test]
    fn test_all_missing_required_fields_reported() {
        let t = template(
            r#"{"id": 3,
                "custom_fields": [
                    {"name": "phone", "label": "Phone", "required": true},
                    {"name": "dept", "label": "Department", "required": true},
                    {"name": "note", "label": "Note"}
                ],
                "fields": [{"name": "year", "required": true}]}"#,
        );
        let s = submission(r#"{"submitter_email": "a@kongu.edu", "dept": "   "}"#);
        assert_matches!(
            validator().validate(&s, Some(&t)),
            Err(ValidationError::MissingFields(labels)) if labels == vec!["Phone", "Department", "year"]
        );
    }

    #[test]
    fn test_email_fields_checked_when_present() {
        let t = template(r#"{"id": 3, "fields": [{"name": "mentor", "label": "Mentor email", "type": "email"}]}"#);
        assert!(validator().validate(&submission(r#"{"submitter_email": "a@kongu.edu"}"#), Some(&t)).is_ok());
        assert_matches!(
            validator().validate(&submission(r#"{"submitter_email": "a@kongu.edu", "mentor": "bad"}"#), Some(&t)),
            Err(ValidationError::InvalidFieldEmail { label }) if label == "Mentor email"
        );
        assert_matches!(
            validator().validate(&submission(r#"{"submitter_email": "a@kongu.edu", "mentor": "m@yahoo.com"}"#), Some(&t)),
            Err(ValidationError::DomainNotAllowed { .. })
        );
    }
}
