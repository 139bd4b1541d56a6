use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use serde::Deserialize;
use serde_json::{json, Value};

const RAZORPAY_ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

/// Order details as reported by the payment gateway. Amount is in minor
/// currency units (paise for INR).
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        notes: Value,
    ) -> Result<GatewayOrder>;
}

/// Test-double gateway: mints plausible order ids locally, no network.
#[derive(Default)]
pub struct MockGateway;

impl MockGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        _notes: Value,
    ) -> Result<GatewayOrder> {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);

        Ok(GatewayOrder {
            id: format!("order_{}", hex::encode(bytes)),
            amount: amount_minor,
            currency: currency.to_string(),
            status: "created".to_string(),
        })
    }
}

pub struct RazorpayGateway {
    client: reqwest::Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        notes: Value,
    ) -> Result<GatewayOrder> {
        let body = json!({
            "amount": amount_minor,
            "currency": currency,
            "payment_capture": 1,
            "notes": notes,
        });

        let response = self
            .client
            .post(RAZORPAY_ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .context("failed to reach payment gateway")?
            .error_for_status()
            .context("payment gateway rejected order creation")?;

        let order = response
            .json::<GatewayOrder>()
            .await
            .context("failed to decode payment gateway order")?;

        Ok(order)
    }
}
