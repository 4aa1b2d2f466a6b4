use crate::config::GatewayConfig;
use crate::errors::ServiceError;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, info, instrument, warn};

type HmacSha256 = Hmac<Sha256>;

pub const MISSING_CREDENTIALS_MESSAGE: &str =
    "Razorpay credentials not configured. Please contact administrator.";

/// Remote payment intent created on the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub intent_id: String,
    /// Amount in paise
    pub amount_minor_units: i64,
    pub currency: String,
    /// Public key the checkout widget is opened with
    pub public_key: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a remote order for `amount` (major units). Not idempotent.
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, ServiceError>;

    /// Checks the checkout callback signature against the configured secret.
    fn verify_payment_signature(
        &self,
        intent_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, ServiceError>;
}

/// Converts a major-unit amount to the gateway's integer minor units,
/// truncating any fraction of a paisa.
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|paise| paise.trunc().to_i64())
        .ok_or_else(|| ServiceError::InvalidRequest("Amount is out of range".to_string()))
}

/// Hex HMAC-SHA256 of `"{intent_id}|{payment_id}"` keyed by `secret`.
pub fn expected_signature(intent_id: &str, payment_id: &str, secret: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(format!("{}|{}", intent_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// True only when `signature` is exactly the expected hex digest.
pub fn verify_signature(intent_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let expected = expected_signature(intent_id, payment_id, secret);
    !expected.is_empty() && constant_time_eq(&expected, signature)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    payment_capture: u8,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Razorpay orders API client.
#[derive(Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client, config })
    }

    fn credentials(&self) -> Result<(&str, &str), ServiceError> {
        match (&self.config.key_id, &self.config.key_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret.as_str())),
            _ => Err(ServiceError::ConfigurationError(
                MISSING_CREDENTIALS_MESSAGE.to_string(),
            )),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self))]
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, ServiceError> {
        let (key_id, key_secret) = self.credentials()?;
        let amount_minor_units = to_minor_units(amount)?;

        let response = self
            .client
            .post(format!("{}/v1/orders", self.config.base_url))
            .basic_auth(key_id, Some(key_secret))
            .json(&CreateOrderRequest {
                amount: amount_minor_units,
                currency,
                payment_capture: 1,
            })
            .send()
            .await
            .map_err(|e| {
                error!("Razorpay order request failed: {}", e);
                ServiceError::GatewayError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<RazorpayErrorBody>(&raw)
                .ok()
                .and_then(|body| {
                    body.error
                        .description
                        .or(body.error.code)
                })
                .unwrap_or(raw);
            warn!(status = status.as_u16(), "Razorpay rejected order creation: {}", detail);
            return Err(ServiceError::GatewayError(format!(
                "{} ({})",
                detail,
                status.as_u16()
            )));
        }

        let order: CreateOrderResponse = response.json().await.map_err(|e| {
            ServiceError::GatewayError(format!("unexpected Razorpay response: {}", e))
        })?;

        info!(
            intent_id = %order.id,
            amount_minor_units = order.amount,
            "Created Razorpay order"
        );

        Ok(PaymentIntent {
            intent_id: order.id,
            amount_minor_units: order.amount,
            currency: order.currency,
            public_key: key_id.to_string(),
        })
    }

    fn verify_payment_signature(
        &self,
        intent_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, ServiceError> {
        let secret = self.config.key_secret.as_deref().ok_or_else(|| {
            ServiceError::ConfigurationError(MISSING_CREDENTIALS_MESSAGE.to_string())
        })?;
        Ok(verify_signature(intent_id, payment_id, signature, secret))
    }
}
