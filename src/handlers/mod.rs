//! HTTP handlers module
//!
//! This module contains all axum handlers organized by area:
//! - Public registration and event listing
//! - Payment verification, webhook and order status
//! - Attendance check and marking
//! - Admin API for sessions, events and form templates

pub mod admin;
pub mod attendance;
pub mod payment;
pub mod registration;
pub mod response;

pub use response::ApiJson;

use std::time::Duration;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use crate::middleware::with_http_layers;
use crate::state::AppState;

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

/// Full application router with tracing and timeout layers
pub fn router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.settings.server.request_timeout_seconds);

    let admin = Router::new()
        .route("/login", post(admin::login))
        .route("/verify", get(admin::verify))
        .route("/logout", post(admin::logout))
        .route("/events", get(admin::list_events).post(admin::create_event))
        .route("/events/:id", put(admin::update_event).delete(admin::archive_event))
        .route("/events/:id/toggle-registration", post(admin::toggle_registration))
        .route("/events/:id/registrations", get(admin::event_registrations))
        .route("/form-templates", get(admin::list_templates).post(admin::create_template))
        .route("/form-templates/:id", put(admin::update_template).delete(admin::delete_template))
        .route("/form-templates/:id/toggle", post(admin::toggle_template))
        .route("/verify-entry", get(attendance::verify_entry))
        .route("/mark-entry", post(attendance::mark_entry));

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/events", get(registration::list_events))
        .route("/api/register/:event_slug", post(registration::submit))
        .route("/api/attendance/check", post(attendance::check))
        .route("/payment/verify", post(payment::verify))
        .route("/payment/webhook", post(payment::webhook))
        .route("/payment/status/:order_id", get(payment::order_status))
        .nest("/api/admin", admin)
        .with_state(state);

    with_http_layers(router, timeout)
}
