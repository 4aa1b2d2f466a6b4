use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{decimal_field, lenient_string, orders::OrderRequest, NumericField};
use crate::errors::ServiceError;

pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePaymentOrderRequest {
    /// Amount in major units (rupees)
    #[schema(value_type = Option<String>, example = "499.00")]
    pub amount: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    /// Checkout form, echoed back by the client on verification
    #[schema(value_type = Option<Object>)]
    pub order_data: Option<Value>,
}

impl CreatePaymentOrderRequest {
    pub fn amount(&self) -> Result<Decimal, ServiceError> {
        match decimal_field(self.amount.as_ref()) {
            NumericField::Missing => Err(ServiceError::InvalidRequest(
                "Amount is required".to_string(),
            )),
            NumericField::Value(a) if a.is_sign_positive() => Ok(a),
            _ => Err(ServiceError::InvalidRequest(
                "Amount must be a positive number".to_string(),
            )),
        }
    }

    pub fn currency(&self) -> String {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentOrderResponse {
    pub success: bool,
    /// Gateway order id to open checkout with
    pub order_id: String,
    /// Amount in minor units (paise)
    pub amount: i64,
    pub currency: String,
    pub razorpay_key_id: String,
}

/// Callback payload forwarded by the storefront after checkout completes.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub razorpay_order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub razorpay_payment_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub razorpay_signature: Option<String>,
    pub order_data: Option<OrderRequest>,
}

/// Gateway identifiers proven by a valid signature.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReceipt {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

impl VerifyPaymentRequest {
    /// Splits the payload, failing when any top-level part is absent.
    pub fn into_parts(self) -> Result<(GatewayReceipt, OrderRequest), ServiceError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (
            present(self.razorpay_order_id),
            present(self.razorpay_payment_id),
            present(self.razorpay_signature),
            self.order_data,
        ) {
            (Some(order_id), Some(payment_id), Some(signature), Some(order)) => Ok((
                GatewayReceipt {
                    order_id,
                    payment_id,
                    signature,
                },
                order,
            )),
            _ => Err(ServiceError::InvalidRequest(
                "Missing payment verification details".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn amount_is_required_and_positive() {
        let req: CreatePaymentOrderRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.amount().unwrap_err().to_string(), "Amount is required");

        let req: CreatePaymentOrderRequest =
            serde_json::from_value(json!({"amount": "-1"})).unwrap();
        assert_matches!(req.amount(), Err(ServiceError::InvalidRequest(_)));

        let req: CreatePaymentOrderRequest =
            serde_json::from_value(json!({"amount": 499.5})).unwrap();
        assert_eq!(req.amount().unwrap(), dec!(499.5));
    }

    #[test]
    fn currency_defaults_to_inr() {
        let req = CreatePaymentOrderRequest::default();
        assert_eq!(req.currency(), "INR");

        let req: CreatePaymentOrderRequest =
            serde_json::from_value(json!({"amount": 1, "currency": "usd"})).unwrap();
        assert_eq!(req.currency(), "USD");
    }

    #[test]
    fn verification_needs_every_part() {
        let req: VerifyPaymentRequest = serde_json::from_value(json!({
            "razorpay_order_id": "order_1",
            "razorpay_payment_id": "pay_1",
            "order_data": {}
        }))
        .unwrap();
        assert_eq!(
            req.into_parts().unwrap_err().to_string(),
            "Missing payment verification details"
        );

        let req: VerifyPaymentRequest = serde_json::from_value(json!({
            "razorpay_order_id": "order_1",
            "razorpay_payment_id": "pay_1",
            "razorpay_signature": "abc"
        }))
        .unwrap();
        assert!(req.into_parts().is_err());
    }
}
