//! Attendance endpoints: public check, admin verify-entry and mark-entry

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use crate::handlers::response::ApiJson;
use crate::middleware::AdminUser;
use crate::models::{lenient, Event, Registration};
use crate::services::AttendanceMark;
use crate::state::AppState;
use crate::utils::errors::{ClubError, Result, ValidationError};

/// Credential triple identifying one registration
#[derive(Debug, Deserialize)]
pub struct EntryLookup {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub event_id: Option<i64>,
    #[serde(default, alias = "regid")]
    pub registration_id: String,
    #[serde(default, alias = "email")]
    pub submitter_email: String,
}

impl EntryLookup {
    fn require(&self) -> Result<(i64, &str, &str)> {
        let event_id = self
            .event_id
            .ok_or_else(|| ClubError::InvalidInput("Missing event id".to_string()))?;
        let credential = self.registration_id.trim();
        let email = self.submitter_email.trim();
        if credential.is_empty() || email.is_empty() {
            return Err(ValidationError::Invalid("Registration ID and email are required".to_string()).into());
        }
        Ok((event_id, credential, email))
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkEntryRequest {
    #[serde(flatten)]
    pub lookup: EntryLookup,
    #[serde(default)]
    pub attendance_type: String,
    #[serde(default)]
    pub attendance_comment: Option<String>,
    #[serde(default)]
    pub participant_attendance: Option<Vec<bool>>,
}

fn attendance_view(event: &Event, registration: &Registration) -> Value {
    json!({
        "success": true,
        "event": {
            "id": event.id,
            "name": event.name,
            "date": event.date,
        },
        "registration": {
            "registration_id": registration.registration_id,
            "submitter_email": registration.submitter_email,
            "participants": registration.participants,
            "timestamp": registration.timestamp,
            "num_participants": registration.num_participants,
            "participant_attendance": registration.participant_attendance,
        },
        "name": registration.display_name(),
        "attendance_status": registration.attendance_status.as_str(),
        "entry_time": registration.entry_time,
        "attendance_comment": registration.attendance_comment,
        "marked_by": registration.marked_by,
    })
}

/// POST /api/attendance/check
pub async fn check(State(state): State<AppState>, ApiJson(lookup): ApiJson<EntryLookup>) -> Result<Json<Value>> {
    let (event_id, credential, email) = lookup.require()?;
    let (event, registration) = state
        .services
        .attendance_service
        .lookup(event_id, credential, email)
        .await?;
    Ok(Json(attendance_view(&event, &registration)))
}

/// GET /api/admin/verify-entry
pub async fn verify_entry(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(lookup): Query<EntryLookup>,
) -> Result<Json<Value>> {
    let (event_id, credential, email) = lookup.require()?;
    let (event, registration) = state
        .services
        .attendance_service
        .lookup(event_id, credential, email)
        .await?;

    let mut body = attendance_view(&event, &registration);
    body["already_marked"] = Value::Bool(registration.is_marked());
    body["payment_status"] = json!(registration.payment_status);
    Ok(Json(body))
}

/// POST /api/admin/mark-entry
pub async fn mark_entry(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(request): ApiJson<MarkEntryRequest>,
) -> Result<Json<Value>> {
    let (event_id, credential, email) = request.lookup.require()?;
    let mark = AttendanceMark::parse(
        request.attendance_type.trim(),
        request.attendance_comment.clone(),
        request.participant_attendance.clone(),
    )?;

    let updated = state
        .services
        .attendance_service
        .mark(event_id, credential, email, mark, &admin.username)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Entry marked successfully",
        "attendance_status": updated.attendance_status.as_str(),
        "entry_time": updated.entry_time,
        "attendance_comment": updated.attendance_comment,
        "participant_attendance": updated.participant_attendance,
        "marked_by": updated.marked_by,
    })))
}
