//! Payment gateway service implementation
//!
//! This service wraps the Razorpay-compatible REST API: order creation,
//! server-side payment verification and webhook signature checks. Every call
//! either returns a fully formed result or a `PaymentError`; nothing is
//! retried or partially applied here.

use std::time::Duration;
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use tracing::{debug, info, warn};
use crate::config::settings::Settings;
use crate::utils::errors::{ClubError, PaymentError, PaymentResult, Result};

type HmacSha256 = Hmac<Sha256>;

/// Customer details forwarded in the order notes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Order created at the gateway, amount in minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "id")]
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

/// Remote view of a single payment
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDetails {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub amount: u64,
}

/// Remote view of an order, as reported to polling clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    #[serde(rename(deserialize = "id"))]
    pub order_id: String,
    pub status: String,
    pub amount: u64,
    #[serde(default)]
    pub amount_paid: u64,
    #[serde(default)]
    pub attempts: u32,
}

/// Payment gateway adapter
#[derive(Clone, Debug)]
pub struct PaymentGateway {
    client: Client,
    api_url: String,
    key_id: String,
    key_secret: String,
    webhook_secret: Option<String>,
    currency: String,
}

impl PaymentGateway {
    /// Create a new PaymentGateway instance
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.payment_timeout())
            .user_agent("ClubPortal/1.0")
            .build()
            .map_err(|e| ClubError::Config(format!("Failed to build payment HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: settings.payment.api_url.trim_end_matches('/').to_string(),
            key_id: settings.payment.key_id.clone(),
            key_secret: settings.payment.key_secret.clone(),
            webhook_secret: settings.payment.webhook_secret.clone().filter(|s| !s.is_empty()),
            currency: settings.payment.currency.clone(),
        })
    }

    /// Public key id handed to the checkout widget
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn webhook_configured(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Create a remote order for `amount` minor units
    pub async fn create_order(&self, receipt: &str, amount: u64, customer: &CustomerInfo) -> PaymentResult<Order> {
        debug!(receipt = %receipt, amount = amount, "Creating payment order");

        let body = json!({
            "amount": amount,
            "currency": self.currency,
            "receipt": receipt,
            "notes": {
                "customer_name": customer.name,
                "customer_email": customer.email,
                "customer_phone": customer.phone,
            }
        });

        let response = self
            .client
            .post(format!("{}/orders", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let order: Order = parse(response).await?;
        info!(order_id = %order.order_id, amount = order.amount, "Payment order created");
        Ok(order)
    }

    /// Check the checkout signature over `order_id|payment_id`
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> PaymentResult<()> {
        let expected = sign(&self.key_secret, format!("{}|{}", order_id, payment_id).as_bytes())?;
        if signatures_match(&expected, signature) {
            Ok(())
        } else {
            warn!(order_id = %order_id, payment_id = %payment_id, "Payment signature mismatch");
            Err(PaymentError::InvalidSignature)
        }
    }

    /// Signature first, then the gateway's own record of the payment
    ///
    /// The payment must be captured, belong to `order_id` and carry exactly
    /// `expected_amount` minor units.
    pub async fn verify_payment(
        &self,
        payment_id: &str,
        order_id: &str,
        signature: &str,
        expected_amount: u64,
    ) -> PaymentResult<PaymentDetails> {
        self.verify_signature(order_id, payment_id, signature)?;

        let response = self
            .client
            .get(format!("{}/payments/{}", self.api_url, payment_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(map_transport_error)?;
        let payment: PaymentDetails = parse(response).await?;

        if payment.status != "captured" {
            warn!(payment_id = %payment_id, status = %payment.status, "Payment not captured");
            return Err(PaymentError::NotCaptured { status: payment.status });
        }
        if payment.order_id.as_deref() != Some(order_id) {
            warn!(payment_id = %payment_id, order_id = %order_id, "Payment belongs to another order");
            return Err(PaymentError::OrderMismatch);
        }
        if payment.amount != expected_amount {
            warn!(
                payment_id = %payment_id,
                expected = expected_amount,
                actual = payment.amount,
                "Payment amount mismatch"
            );
            return Err(PaymentError::AmountMismatch {
                expected: expected_amount,
                actual: payment.amount,
            });
        }

        info!(payment_id = %payment_id, order_id = %order_id, "Payment verified with gateway");
        Ok(payment)
    }

    /// Check a webhook body against the configured webhook secret
    pub fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> PaymentResult<()> {
        let secret = self.webhook_secret.as_deref().ok_or(PaymentError::WebhookNotConfigured)?;
        let expected = sign(secret, body)?;
        if signatures_match(&expected, signature) {
            Ok(())
        } else {
            Err(PaymentError::InvalidSignature)
        }
    }

    /// Fetch the remote state of an order
    pub async fn order_status(&self, order_id: &str) -> PaymentResult<OrderStatus> {
        let response = self
            .client
            .get(format!("{}/orders/{}", self.api_url, order_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(map_transport_error)?;
        parse(response).await
    }

    /// Gateway reachability, any HTTP answer counts
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(&self.api_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Payment gateway health check failed");
                false
            }
        }
    }
}

/// Hex HMAC-SHA256 of `message`
pub fn sign(secret: &str, message: &[u8]) -> PaymentResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn signatures_match(expected: &str, claimed: &str) -> bool {
    constant_time_eq(expected.as_bytes(), claimed.trim().to_ascii_lowercase().as_bytes())
}

fn map_transport_error(e: reqwest::Error) -> PaymentError {
    if e.is_timeout() {
        PaymentError::Timeout
    } else {
        PaymentError::Network(e.to_string())
    }
}

async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> PaymentResult<T> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        warn!("Payment gateway rejected credentials");
        return Err(PaymentError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Payment gateway error");
        return Err(PaymentError::Gateway { status: status.as_u16() });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| PaymentError::InvalidResponse(e.to_string()))
}
