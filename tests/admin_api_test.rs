//! Admin API: sessions, event and form template management

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use serde_json::json;

#[tokio::test]
async fn test_login_verify_logout() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_json("/api/admin/login", json!({ "username": ADMIN_USERNAME, "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let token = ctx.admin_token().await;
    let (status, body) = ctx.get_as("/api/admin/verify", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["username"], ADMIN_USERNAME);

    let (status, _) = ctx.post_json_as("/api/admin/logout", json!({}), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx.get_as("/api/admin/verify", &token).await;
    assert_eq!(body["valid"], false);

    let (status, body) = ctx.get_as("/api/admin/events", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_login_disabled_without_configured_password() {
    let ctx = TestContext::with_settings(|s| s.admin.password = String::new()).await;

    let (status, _) = ctx
        .post_json("/api/admin/login", json!({ "username": ADMIN_USERNAME, "password": "" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let ctx = TestContext::new().await;

    for uri in ["/api/admin/events", "/api/admin/form-templates", "/api/admin/events/1/registrations"] {
        let (status, body) = ctx.get(uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["code"], "unauthorized");
    }

    let (status, _) = ctx.get_as("/api/admin/events", "forged-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_event_lifecycle() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .post_json_as(
            "/api/admin/events",
            json!({
                "id": 42,
                "name": "Rust Meetup",
                "date": "2099-05-01",
                "registration_type": "internal",
                "template_id": FREE_TEMPLATE_ID,
                "registration_file": "../escape.json",
                "location": "Lab 3"
            }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], 7);
    assert_eq!(body["event"]["location"], "Lab 3");
    assert_eq!(body["event"]["registration_file"], "rust-meetup_7_registrations.json");

    let (status, body) = ctx
        .post_json_as("/api/admin/events", json!({ "name": "  " }), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Event name is required");

    let (status, body) = ctx
        .put_json_as(
            "/api/admin/events/7",
            json!({
                "id": 99,
                "location": null,
                "date": "2099-06-01",
                "registration_file": "other.json"
            }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["event"]["id"], 7);
    assert_eq!(body["event"]["date"], "2099-06-01");
    assert!(body["event"].get("location").is_none());
    assert_eq!(body["event"]["registration_file"], "rust-meetup_7_registrations.json");

    let (status, body) = ctx
        .post_json_as("/api/admin/events/7/toggle-registration", json!({}), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allow_registration"], false);

    let (status, body) = ctx.delete_as("/api/admin/events/7", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["status"], "completed");
    assert_eq!(body["event"]["registration_type"], "none");

    let (status, body) = ctx.get_as("/api/admin/events", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 7);

    let (status, _) = ctx
        .put_json_as("/api/admin/events/404", json!({ "name": "Ghost" }), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_toggled_registration_blocks_public_submissions() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let (_, body) = ctx
        .post_json_as(
            &format!("/api/admin/events/{}/toggle-registration", FREE_EVENT_ID),
            json!({}),
            &token,
        )
        .await;
    assert_eq!(body["allow_registration"], false);

    let (status, body) = ctx
        .post_json("/api/register/code-sprint", free_submission("late@kongu.edu"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Registration is currently closed for this event");
}

#[tokio::test]
async fn test_event_registrations_view() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    for email in ["one@kongu.edu", "two@kongu.edu"] {
        let (status, _) = ctx.post_json("/api/register/code-sprint", free_submission(email)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = ctx
        .get_as(&format!("/api/admin/events/{}/registrations", FREE_EVENT_ID), &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["event"]["name"], "Code Sprint");
    assert_eq!(body["form_template"]["id"], FREE_TEMPLATE_ID);
    let registrations = body["registrations"].as_array().unwrap();
    assert_eq!(registrations.len(), 2);
    assert_eq!(registrations[1]["submitter_email"], "two@kongu.edu");
    assert_eq!(registrations[1]["department"], "CSE");
}

#[tokio::test]
async fn test_template_lifecycle() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .post_json_as(
            "/api/admin/form-templates",
            json!({
                "name": "Quiz form",
                "min_participants": 1,
                "max_participants": 2,
                "custom_fields": [{ "name": "college", "label": "College", "required": true }]
            }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], 4);
    assert_eq!(body["template"]["active"], true);
    assert_eq!(body["template"]["custom_fields"][0]["type"], "text");

    let (status, body) = ctx
        .post_json_as(
            "/api/admin/form-templates",
            json!({ "name": "Broken", "min_participants": 3, "max_participants": 2 }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid participant limits");

    let (status, body) = ctx
        .put_json_as(
            "/api/admin/form-templates/4",
            json!({ "payment_enabled": true, "payment_amount": 49.5 }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"]["payment_amount"], 49.5);
    assert_eq!(body["template"]["name"], "Quiz form");

    let (_, body) = ctx
        .post_json_as("/api/admin/form-templates/4/toggle", json!({}), &token)
        .await;
    assert_eq!(body["active"], false);

    let (status, _) = ctx.delete_as("/api/admin/form-templates/4", &token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = ctx.delete_as("/api/admin/form-templates/4", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Template not found");

    let (_, body) = ctx.get_as("/api/admin/form-templates", &token).await;
    assert_eq!(body["templates"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_inactive_template_rejects_submissions() {
    let ctx = TestContext::new().await;
    let token = ctx.admin_token().await;

    let (_, body) = ctx
        .post_json_as(
            &format!("/api/admin/form-templates/{}/toggle", FREE_TEMPLATE_ID),
            json!({}),
            &token,
        )
        .await;
    assert_eq!(body["active"], false);

    let (status, body) = ctx
        .post_json("/api/register/code-sprint", free_submission("a@kongu.edu"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Registration form is inactive");
}
