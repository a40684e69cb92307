//! Payment Gateway Order API
//!
//! Abstraction over the gateway's server-side order endpoint, with a Razorpay
//! implementation and a mock for tests and gateway-less development.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{PaymentError, Result};

/// Gateway credentials and endpoint
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Public key id, safe to hand to the client widget
    pub key_id: String,

    /// Server-only secret; signs orders and verifies payment signatures
    pub key_secret: String,

    /// Order API base URL
    pub base_url: String,
}

impl GatewayConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let key_id = std::env::var("RAZORPAY_KEY_ID")
            .map_err(|_| PaymentError::Config("RAZORPAY_KEY_ID not set".into()))?;
        let key_secret = std::env::var("RAZORPAY_KEY_SECRET")
            .map_err(|_| PaymentError::Config("RAZORPAY_KEY_SECRET not set".into()))?;
        let base_url = std::env::var("RAZORPAY_BASE_URL")
            .unwrap_or_else(|_| "https://api.razorpay.com".into());

        Ok(Self {
            key_id,
            key_secret,
            base_url,
        })
    }
}

/// Notes attached to an order so the verifier can cross-check them later
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNotes {
    pub user_id: String,
    pub item_id: String,
    pub item_type: String,
    /// Total in minor units, as a string (gateway notes are string-valued)
    pub amount: String,
}

/// Order-creation request sent to the gateway
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Total in integer minor units (paise)
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// Order handle returned by the gateway
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Raw order-API response, validated before it becomes a `GatewayOrder`
#[derive(Debug, Deserialize)]
struct RawOrderResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
}

/// Gateway order API trait
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create an order at the gateway
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder>;

    /// Public key id for the client widget
    fn key_id(&self) -> &str;

    /// Gateway name
    fn name(&self) -> &str;
}

/// Razorpay order API client
pub struct RazorpayGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(GatewayConfig::from_env()?))
    }
}

#[async_trait]
impl OrderGateway for RazorpayGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder> {
        let url = format!("{}/v1/orders", self.config.base_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Gateway rejected order creation");
            return Err(PaymentError::OrderCreation(format!(
                "gateway returned {status}: {body}"
            )));
        }

        let raw: RawOrderResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::OrderCreation(e.to_string()))?;

        let id = match raw.id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(PaymentError::OrderCreation("no order id in response".into())),
        };

        Ok(GatewayOrder {
            id,
            amount: raw.amount.unwrap_or(request.amount),
            currency: raw.currency.unwrap_or_else(|| request.currency.clone()),
        })
    }

    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    fn name(&self) -> &str {
        "Razorpay"
    }
}

/// Mock gateway for tests and gateway-less development
pub struct MockGateway {
    counter: AtomicU64,
    fail_next: RwLock<bool>,
    orders: RwLock<Vec<OrderRequest>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            fail_next: RwLock::new(false),
            orders: RwLock::new(Vec::new()),
        }
    }

    /// Make the next `create_order` call fail (for testing the error path)
    pub fn fail_next(&self) {
        *self.fail_next.write().unwrap() = true;
    }

    /// Requests seen so far
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.read().unwrap().clone()
    }
}

#[async_trait]
impl OrderGateway for MockGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder> {
        if std::mem::take(&mut *self.fail_next.write().unwrap()) {
            return Err(PaymentError::Gateway("mock gateway unavailable".into()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.orders.write().unwrap().push(request.clone());

        Ok(GatewayOrder {
            id: format!("order_mock{n:08}"),
            amount: request.amount,
            currency: request.currency.clone(),
        })
    }

    fn key_id(&self) -> &str {
        "rzp_test_mock"
    }

    fn name(&self) -> &str {
        "MockGateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OrderRequest {
        OrderRequest {
            amount: 1_179_882,
            currency: "INR".into(),
            receipt: "rcpt_1".into(),
            notes: OrderNotes {
                user_id: "u1".into(),
                item_id: "standard".into(),
                item_type: "plan".into(),
                amount: "1179882".into(),
            },
        }
    }

    #[tokio::test]
    async fn test_mock_gateway_issues_order_ids() {
        let gateway = MockGateway::new();
        let a = gateway.create_order(&request()).await.unwrap();
        let b = gateway.create_order(&request()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.amount, 1_179_882);
        assert_eq!(gateway.orders().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_gateway_failure() {
        let gateway = MockGateway::new();
        gateway.fail_next();
        assert!(gateway.create_order(&request()).await.is_err());
        // Recovers afterwards
        assert!(gateway.create_order(&request()).await.is_ok());
    }
}
