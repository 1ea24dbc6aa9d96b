//! Authentication middleware
//!
//! Bearer-token guard for the admin API. Handlers that take an `AdminUser`
//! are only reached with a live admin session.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::{debug, warn};
use crate::state::AppState;
use crate::utils::errors::ClubError;

/// Authenticated admin behind the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub username: String,
    pub token: String,
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ClubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ClubError::Unauthorized("Authentication required".to_string()))?;

        match state.services.auth_service.verify(token) {
            Some(session) => {
                debug!(username = %session.username, path = %parts.uri.path(), "Admin request authenticated");
                Ok(AdminUser {
                    username: session.username,
                    token: token.to_string(),
                })
            }
            None => {
                warn!(path = %parts.uri.path(), "Rejected admin request with invalid token");
                Err(ClubError::Unauthorized("Invalid or expired token".to_string()))
            }
        }
    }
}
