//! Admin API: sessions, events and form templates

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use crate::handlers::response::ApiJson;
use crate::middleware::AdminUser;
use crate::state::AppState;
use crate::utils::errors::Result;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/admin/login
pub async fn login(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> Result<Json<Value>> {
    let token = state.services.auth_service.login(&request.username, &request.password)?;
    Ok(Json(json!({ "success": true, "token": token })))
}

/// GET /api/admin/verify
pub async fn verify(admin: Option<AdminUser>) -> Json<Value> {
    match admin {
        Some(admin) => Json(json!({ "valid": true, "username": admin.username })),
        None => Json(json!({ "valid": false })),
    }
}

/// POST /api/admin/logout
pub async fn logout(State(state): State<AppState>, admin: AdminUser) -> Json<Value> {
    state.services.auth_service.logout(&admin.token);
    Json(json!({ "success": true }))
}

pub async fn list_events(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Value>> {
    let events = state.services.admin_service.list_events().await?;
    Ok(Json(json!({ "success": true, "events": events })))
}

pub async fn create_event(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>> {
    let event = state.services.admin_service.create_event(&admin.username, payload).await?;
    Ok(Json(json!({ "success": true, "id": event.id, "event": event })))
}

pub async fn update_event(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>> {
    let event = state.services.admin_service.update_event(&admin.username, id, patch).await?;
    Ok(Json(json!({ "success": true, "event": event })))
}

/// DELETE /api/admin/events/:id archives the event
pub async fn archive_event(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let event = state.services.admin_service.archive_event(&admin.username, id).await?;
    Ok(Json(json!({ "success": true, "message": "Event archived", "event": event })))
}

pub async fn toggle_registration(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let allow = state.services.admin_service.toggle_registration(&admin.username, id).await?;
    Ok(Json(json!({ "success": true, "allow_registration": allow })))
}

pub async fn event_registrations(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let view = state.services.admin_service.event_registrations(id).await?;
    Ok(Json(json!({
        "success": true,
        "event": view.event,
        "registrations": view.registrations,
        "form_template": view.form_template,
    })))
}

pub async fn list_templates(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Value>> {
    let templates = state.services.admin_service.list_templates().await?;
    Ok(Json(json!({ "success": true, "templates": templates })))
}

pub async fn create_template(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>> {
    let template = state.services.admin_service.create_template(&admin.username, payload).await?;
    Ok(Json(json!({ "success": true, "id": template.id, "template": template })))
}

pub async fn update_template(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>> {
    let template = state.services.admin_service.update_template(&admin.username, id, patch).await?;
    Ok(Json(json!({ "success": true, "template": template })))
}

pub async fn delete_template(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    state.services.admin_service.delete_template(&admin.username, id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn toggle_template(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let active = state.services.admin_service.toggle_template(&admin.username, id).await?;
    Ok(Json(json!({ "success": true, "active": active })))
}
