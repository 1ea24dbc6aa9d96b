//! JSON envelopes
//!
//! Every failure leaves the API as
//! `{"success": false, "error", "code", "missing"?, "details"?, "registration_id"?}`.
//! Storage and internal failures are logged in full and answered generically.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::{error, warn};
use crate::utils::errors::{ClubError, ErrorKind, PaymentError};

const GENERIC_FAILURE: &str = "An internal error occurred. Please try again later.";

/// `axum::Json` whose rejections use the error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ClubError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ClubError {
    fn from(rejection: JsonRejection) -> Self {
        ClubError::InvalidInput(rejection.body_text())
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Conflict | ErrorKind::Gateway => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Storage | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn public_message(err: &ClubError) -> String {
    match err {
        ClubError::Unauthorized(message) => message.clone(),
        ClubError::Payment(PaymentError::WebhookNotConfigured) => err.to_string(),
        ClubError::Payment(PaymentError::Unauthorized) => "Payment gateway configuration error".to_string(),
        ClubError::Payment(e) if !e.is_verification_failure() => "Failed to reach payment gateway".to_string(),
        ClubError::Mail(_) => "Failed to send email".to_string(),
        _ => match err.kind() {
            ErrorKind::Storage | ErrorKind::Internal => GENERIC_FAILURE.to_string(),
            _ => err.to_string(),
        },
    }
}

impl IntoResponse for ClubError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        match kind {
            ErrorKind::Storage | ErrorKind::Internal => {
                error!(severity = %self.severity(), code = kind.as_str(), error = %self, "Request failed");
            }
            ErrorKind::Gateway => warn!(code = kind.as_str(), error = %self, "Upstream service failed"),
            _ => {}
        }

        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(false));
        body.insert("error".into(), Value::from(public_message(&self)));
        body.insert("code".into(), Value::from(kind.as_str()));

        match &self {
            ClubError::Validation(v) => {
                if let Some(missing) = v.missing() {
                    body.insert("missing".into(), json!(missing));
                }
                if let Some(details) = v.details() {
                    body.insert("details".into(), Value::from(details));
                }
            }
            ClubError::Payment(p) => {
                if let Some(details) = p.details() {
                    body.insert("details".into(), Value::from(details));
                }
            }
            ClubError::Conflict { registration_id: Some(id), .. } => {
                body.insert("registration_id".into(), Value::from(id.clone()));
            }
            _ => {}
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::ValidationError;

    async fn body_of(err: ClubError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_fields_envelope() {
        let (status, body) =
            body_of(ValidationError::MissingFields(vec!["Phone".into(), "Department".into()]).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required fields");
        assert_eq!(body["code"], "validation");
        assert_eq!(body["missing"], json!(["Phone", "Department"]));
    }

    #[tokio::test]
    async fn test_storage_errors_are_generic() {
        let (status, body) = body_of(ClubError::Storage("/srv/data/x.json: permission denied".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], GENERIC_FAILURE);
        assert!(!body.to_string().contains("/srv/data"));
    }

    #[tokio::test]
    async fn test_conflict_carries_registration_id() {
        let (status, body) = body_of(ClubError::Conflict {
            message: "Payment already processed".into(),
            registration_id: Some("r1".into()),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "conflict");
        assert_eq!(body["registration_id"], "r1");
    }

    #[tokio::test]
    async fn test_gateway_error_hides_provider_detail() {
        let (status, body) = body_of(PaymentError::Network("tcp reset by 10.0.0.3".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "gateway");
        assert_eq!(body["details"], "Please try again or contact support.");
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_not_found_and_unauthorized() {
        let (status, body) = body_of(ClubError::NotFound("Event not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Event not found");

        let (status, body) = body_of(ClubError::Unauthorized("Invalid credentials".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }
}
