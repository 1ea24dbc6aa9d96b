//! Mock payment gateway
//!
//! A wiremock server standing in for the provider's REST API. Each `mock_*`
//! method mounts one endpoint; `MockResponseConfig` controls failures.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock payment gateway server
pub struct PaymentMockServer {
    pub server: MockServer,
    pub base_url: String,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    /// HTTP status returned by the mock
    pub status: u16,
    pub delay_ms: Option<u64>,
    pub custom_response: Option<Value>,
}

impl Default for MockResponseConfig {
    fn default() -> Self {
        Self {
            status: 200,
            delay_ms: None,
            custom_response: None,
        }
    }
}

impl MockResponseConfig {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

impl PaymentMockServer {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Base URL to put in `payment.api_url`
    pub fn api_url(&self) -> String {
        self.base_url.clone()
    }

    fn respond(config: &MockResponseConfig, default_body: Value) -> ResponseTemplate {
        let body = config.custom_response.clone().unwrap_or(default_body);
        let mut template = ResponseTemplate::new(config.status).set_body_json(body);
        if let Some(delay) = config.delay_ms {
            template = template.set_delay(Duration::from_millis(delay));
        }
        template
    }

    /// POST /orders answering with `order_id` for `amount` minor units
    pub async fn mock_create_order(&self, order_id: &str, amount: u64, config: MockResponseConfig) {
        let body = json!({
            "id": order_id,
            "entity": "order",
            "amount": amount,
            "amount_paid": 0,
            "currency": "INR",
            "receipt": "rcpt",
            "status": "created",
            "attempts": 0
        });
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(header_exists("authorization"))
            .respond_with(Self::respond(&config, body))
            .mount(&self.server)
            .await;
    }

    /// GET /payments/{payment_id}
    pub async fn mock_payment(&self, payment_id: &str, status: &str, order_id: &str, amount: u64) {
        let body = json!({
            "id": payment_id,
            "entity": "payment",
            "status": status,
            "order_id": order_id,
            "amount": amount,
            "currency": "INR"
        });
        Mock::given(method("GET"))
            .and(path(format!("/payments/{}", payment_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// GET /orders/{order_id}
    pub async fn mock_order_status(&self, order_id: &str, status: &str, amount: u64, amount_paid: u64) {
        let body = json!({
            "id": order_id,
            "entity": "order",
            "status": status,
            "amount": amount,
            "amount_paid": amount_paid,
            "attempts": 1
        });
        Mock::given(method("GET"))
            .and(path(format!("/orders/{}", order_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Every order request rejected with 401
    pub async fn mock_bad_credentials(&self) {
        self.mock_create_order(
            "unused",
            0,
            MockResponseConfig {
                status: 401,
                delay_ms: None,
                custom_response: Some(json!({
                    "error": { "code": "BAD_REQUEST_ERROR", "description": "Authentication failed" }
                })),
            },
        )
        .await;
    }

    /// Number of requests the gateway has seen
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }
}
