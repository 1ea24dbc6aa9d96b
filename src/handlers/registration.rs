//! Public registration endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use crate::handlers::response::ApiJson;
use crate::models::Submission;
use crate::services::registration::{RegistrationOutcome, RegistrationReceipt};
use crate::state::AppState;
use crate::utils::errors::Result;

/// GET /api/events
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Value>> {
    let events = state.db.events.list().await?;
    Ok(Json(json!({ "success": true, "events": events })))
}

/// POST /api/register/:event_slug
pub async fn submit(
    State(state): State<AppState>,
    Path(event_slug): Path<String>,
    ApiJson(submission): ApiJson<Submission>,
) -> Result<Json<Value>> {
    let outcome = state
        .services
        .registration_service
        .register(&event_slug, submission)
        .await?;

    Ok(Json(match outcome {
        RegistrationOutcome::Registered(receipt) => receipt_body(&receipt, "Registration submitted successfully!"),
        RegistrationOutcome::PaymentRequired(pending) => json!({
            "success": true,
            "payment_required": true,
            "order_id": pending.order_id,
            "amount": pending.amount,
            "currency": pending.currency,
            "key_id": pending.key_id,
            "registration_data": pending.registration,
            "registration_file": pending.registration_file,
        }),
    }))
}

/// Success envelope shared by submission and payment verification
pub(crate) fn receipt_body(receipt: &RegistrationReceipt, headline: &str) -> Value {
    let message = if receipt.email_sent {
        format!("{} Confirmation email sent.", headline)
    } else {
        headline.to_string()
    };
    json!({
        "success": true,
        "message": message,
        "registration_id": receipt.registration_id,
        "email_sent": receipt.email_sent,
        "qr_code": receipt.qr_code,
    })
}
