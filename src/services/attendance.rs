//! Attendance ledger
//!
//! Resolves a credential plus submitter email to one registration and records
//! door verdicts. Marks are written through the record store's locked
//! read-modify-write, so concurrent marks in one event file never clobber each
//! other. Re-marking overwrites the previous verdict.

use chrono::{FixedOffset, Utc};
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::models::{AttendanceStatus, Event, Registration};
use crate::utils::errors::{ClubError, Result, ValidationError};
use crate::utils::logging::log_attendance_mark;

/// Deliberately silent about which of credential or email was wrong
pub const NOT_FOUND_MESSAGE: &str = "Registration not found. Please check your email and registration ID.";

/// Presence verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceMark {
    Full,
    Partial(Option<String>),
    /// One flag per participant slot
    Participants(Vec<bool>),
}

impl AttendanceMark {
    /// Build a mark from the wire `attendance_type` and its companions
    pub fn parse(kind: &str, comment: Option<String>, flags: Option<Vec<bool>>) -> Result<Self> {
        match kind {
            "" | "full" => Ok(AttendanceMark::Full),
            "partial" => Ok(AttendanceMark::Partial(comment.filter(|c| !c.trim().is_empty()))),
            "participants" => Ok(AttendanceMark::Participants(flags.unwrap_or_default())),
            other => Err(ValidationError::Invalid(format!("Unknown attendance type: {}", other)).into()),
        }
    }

    /// Apply the verdict to `registration`
    fn apply(&self, registration: &mut Registration, marked_by: &str, now: String) -> Result<()> {
        match self {
            AttendanceMark::Full => {
                registration.attendance_status = AttendanceStatus::Entered;
                registration.attendance_comment = None;
                registration.participant_attendance.clear();
            }
            AttendanceMark::Partial(comment) => {
                registration.attendance_status = AttendanceStatus::PartiallyPresent;
                registration.attendance_comment = comment.clone();
                registration.participant_attendance.clear();
            }
            AttendanceMark::Participants(flags) => {
                let total = slot_count(registration);
                if flags.is_empty() {
                    return Err(ValidationError::Invalid("Participant attendance is required".to_string()).into());
                }
                if flags.len() != total {
                    return Err(ValidationError::Invalid(format!(
                        "Participant attendance must have {} entries",
                        total
                    ))
                    .into());
                }

                let present = flags.iter().filter(|p| **p).count();
                registration.attendance_status = match present {
                    0 => AttendanceStatus::NotEntered,
                    n if n == total => AttendanceStatus::Entered,
                    _ => AttendanceStatus::PartiallyPresent,
                };
                registration.attendance_comment = Some(format!("{}/{} participants present", present, total));
                registration.participant_attendance = flags.clone();
            }
        }
        registration.entry_time = Some(now);
        registration.marked_by = Some(marked_by.to_string());
        Ok(())
    }
}

fn slot_count(registration: &Registration) -> usize {
    if !registration.participants.is_empty() {
        registration.participants.len()
    } else {
        registration.num_participants.unwrap_or(1).max(1) as usize
    }
}

#[derive(Clone, Debug)]
pub struct AttendanceService {
    db: DatabaseService,
    offset: FixedOffset,
}

impl AttendanceService {
    pub fn new(settings: &Settings, db: DatabaseService) -> Self {
        Self {
            db,
            offset: settings.local_offset(),
        }
    }

    async fn event(&self, event_id: i64) -> Result<Event> {
        self.db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| ClubError::NotFound("Event not found".to_string()))
    }

    /// Registration matching both the credential and the submitter email
    pub async fn lookup(&self, event_id: i64, credential: &str, email: &str) -> Result<(Event, Registration)> {
        let event = self.event(event_id).await?;
        let registration = self
            .db
            .registrations_for(&event)
            .await?
            .into_iter()
            .find(|r| r.matches_credential(credential, email))
            .ok_or_else(|| ClubError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;
        Ok((event, registration))
    }

    /// Record a verdict; returns the updated registration
    pub async fn mark(
        &self,
        event_id: i64,
        credential: &str,
        email: &str,
        mark: AttendanceMark,
        marked_by: &str,
    ) -> Result<Registration> {
        let event = self.event(event_id).await?;
        let file = self.db.registration_file_for(&event);
        let now = Utc::now().with_timezone(&self.offset).to_rfc3339();

        let credential_owned = credential.to_string();
        let email_owned = email.to_string();
        let marked_by_owned = marked_by.to_string();

        let updated = self
            .db
            .registrations
            .modify(&file, move |records| {
                let registration = records
                    .iter_mut()
                    .find(|r| r.matches_credential(&credential_owned, &email_owned))
                    .ok_or_else(|| ClubError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;
                mark.apply(registration, &marked_by_owned, now)?;
                Ok(registration.clone())
            })
            .await?;

        log_attendance_mark(event_id, credential, updated.attendance_status.as_str(), marked_by);
        Ok(updated)
    }
}
