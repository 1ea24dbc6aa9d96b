//! Payment endpoints: verification, webhook and order status

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use crate::handlers::registration::receipt_body;
use crate::handlers::response::ApiJson;
use crate::services::registration::PaymentVerification;
use crate::state::AppState;
use crate::utils::errors::{ClubError, PaymentError, Result, ValidationError};

pub const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// POST /payment/verify
pub async fn verify(
    State(state): State<AppState>,
    ApiJson(verification): ApiJson<PaymentVerification>,
) -> Result<Json<Value>> {
    let receipt = state
        .services
        .registration_service
        .verify_payment(verification)
        .await?;
    Ok(Json(receipt_body(&receipt, "Payment verified and registration completed!")))
}

/// POST /payment/webhook
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let outcome = state
        .services
        .registration_service
        .handle_webhook(&body, signature)
        .await
        .map_err(|e| match e {
            ClubError::Payment(PaymentError::InvalidSignature) => {
                ClubError::Validation(ValidationError::Invalid("Invalid signature".to_string()))
            }
            ClubError::Config(_) => ClubError::Payment(PaymentError::WebhookNotConfigured),
            other => other,
        })?;

    Ok(Json(json!({
        "success": true,
        "event": outcome.event,
        "updated": outcome.updated.is_some(),
    })))
}

/// GET /payment/status/:order_id
pub async fn order_status(State(state): State<AppState>, Path(order_id): Path<String>) -> Result<Json<Value>> {
    let status = state.services.registration_service.order_status(&order_id).await?;
    Ok(Json(json!({
        "success": true,
        "order_id": status.order_id,
        "status": status.status,
        "amount": status.amount,
        "amount_paid": status.amount_paid,
        "attempts": status.attempts,
    })))
}
