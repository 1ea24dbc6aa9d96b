//! Test context for unified test setup
//!
//! Builds the whole application over a temporary data directory and exposes
//! request helpers that go through the real router.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;
use tower::ServiceExt;
use ClubPortal::models::Registration;
use ClubPortal::{handlers, AppState, DatabaseService, ServiceFactory, Settings};

use super::mail_mock::RecordingMailTransport;
use super::payment_mock::PaymentMockServer;
use super::test_data::*;

static INIT: Once = Once::new();

/// Initialize test logging once per test binary
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ClubPortal=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub temp_dir: TempDir,
    pub settings: Settings,
    pub db: DatabaseService,
    pub state: AppState,
    pub mail: Arc<RecordingMailTransport>,
    pub payments: PaymentMockServer,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    /// Context whose settings are adjusted by `configure` before services start
    pub async fn with_settings(configure: impl FnOnce(&mut Settings)) -> Self {
        Self::build(configure, Arc::new(RecordingMailTransport::new())).await
    }

    pub async fn build(configure: impl FnOnce(&mut Settings), mail: Arc<RecordingMailTransport>) -> Self {
        init_test_env();

        let temp_dir = TempDir::new().expect("temp dir");
        let payments = PaymentMockServer::new().await;

        let mut settings = Settings::default();
        settings.storage.data_dir = temp_dir.path().to_path_buf();
        settings.server.public_base_url = "https://portal.test".to_string();
        settings.payment.api_url = payments.api_url();
        settings.payment.key_id = KEY_ID.to_string();
        settings.payment.key_secret = KEY_SECRET.to_string();
        settings.payment.webhook_secret = Some(WEBHOOK_SECRET.to_string());
        settings.payment.timeout_seconds = 2;
        settings.admin.username = ADMIN_USERNAME.to_string();
        settings.admin.password = ADMIN_PASSWORD.to_string();
        settings.logging.level = "debug".to_string();
        configure(&mut settings);

        std::fs::write(settings.events_path(), seed_events().to_string()).expect("seed events");
        std::fs::write(settings.form_templates_path(), seed_templates().to_string()).expect("seed templates");

        let db = DatabaseService::new(&settings);
        db.initialize().await.expect("storage initialized");

        let services = ServiceFactory::with_mail_transport(&settings, db.clone(), mail.clone())
            .expect("services built");
        let state = AppState::new(settings.clone(), db.clone(), services);

        Self {
            temp_dir,
            settings,
            db,
            state,
            mail,
            payments,
        }
    }

    pub fn router(&self) -> Router {
        handlers::router(self.state.clone())
    }

    /// Send one request through a fresh router, returning status and JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        send_to(self.router(), request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, None, None)).await
    }

    pub async fn get_as(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, None, Some(token))).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, Some(body), None)).await
    }

    pub async fn post_json_as(&self, uri: &str, body: Value, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, Some(body), Some(token))).await
    }

    pub async fn put_json_as(&self, uri: &str, body: Value, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::PUT, uri, Some(body), Some(token))).await
    }

    pub async fn delete_as(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, uri, None, Some(token))).await
    }

    /// Log in with the configured admin credentials
    pub async fn admin_token(&self) -> String {
        let (status, body) = self
            .post_json(
                "/api/admin/login",
                serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {}", body);
        body["token"].as_str().expect("token in login response").to_string()
    }

    /// Stored registrations of an event, read through the record store
    pub async fn registrations(&self, event_id: i64) -> Vec<Registration> {
        let event = self
            .db
            .events
            .find_by_id(event_id)
            .await
            .expect("catalog readable")
            .expect("event exists");
        self.db.registrations_for(&event).await.expect("registrations readable")
    }

    /// Contents of every file under the data directory
    pub fn data_snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect_files(self.temp_dir.path(), &mut files);
        files
    }
}

fn collect_files(dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in std::fs::read_dir(dir).expect("data dir readable") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect_files(&path, files);
        } else {
            let body = std::fs::read(&path).expect("data file readable");
            files.insert(path, body);
        }
    }
}

/// Build a request with an optional JSON body and bearer token
pub fn request(method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub async fn send_to(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
