use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{decimal_field, integer_field, lenient_string, NumericField};
use crate::entities::order::{self, OrderStatus, PaymentStatus};
use crate::errors::ServiceError;

/// Checkout form as posted by the storefront. Every field is optional at the
/// wire level so that a missing one can be reported by name.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct OrderRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: Option<String>,
    #[schema(value_type = Option<i32>, example = 1)]
    pub quantity: Option<Value>,
    #[schema(value_type = Option<String>, example = "399.00")]
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pin_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub house_flat_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub street_locality: Option<String>,
    /// `COD` (default) or `ONLINE`
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_mode: Option<String>,
}

/// Validated order fields, ready to be snapshotted into an order row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub product_title: String,
    pub size: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total_amount: Decimal,
    pub full_name: String,
    pub mobile: String,
    pub country_code: String,
    pub pin_code: String,
    pub state: String,
    pub city: String,
    pub house_flat_no: String,
    pub street_locality: String,
}

/// Largest amount an order column (`decimal(10, 2)`) can hold.
pub const MAX_ORDER_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Trimmed, non-blank text no longer than its column (`max_chars`).
fn required_text(
    value: Option<String>,
    field: &str,
    max_chars: usize,
) -> Result<String, ServiceError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(ServiceError::missing_field(field)),
        Some(v) if v.chars().count() > max_chars => Err(ServiceError::invalid_field(field)),
        Some(v) => Ok(v),
        None => Err(ServiceError::missing_field(field)),
    }
}

impl OrderRequest {
    pub fn wants_online_payment(&self) -> bool {
        self.payment_mode
            .as_deref()
            .map(|m| m.trim().eq_ignore_ascii_case("ONLINE"))
            .unwrap_or(false)
    }

    /// Checks required fields in form order and reports the first one missing.
    pub fn into_details(self) -> Result<OrderDetails, ServiceError> {
        let product_title = required_text(self.product_title, "product_title", 200)?;
        let size = required_text(self.size, "size", 10)?;

        let quantity = match integer_field(self.quantity.as_ref()) {
            NumericField::Missing => return Err(ServiceError::missing_field("quantity")),
            NumericField::Value(q) if (1..=i32::MAX as i64).contains(&q) => q as i32,
            _ => return Err(ServiceError::invalid_field("quantity")),
        };

        let price = match decimal_field(self.price.as_ref()) {
            NumericField::Missing => return Err(ServiceError::missing_field("price")),
            NumericField::Value(p) if p.is_sign_positive() && p <= MAX_ORDER_AMOUNT => {
                p.round_dp(2)
            }
            _ => return Err(ServiceError::invalid_field("price")),
        };
        let total_amount = order::line_total(price, quantity)
            .filter(|total| *total <= MAX_ORDER_AMOUNT)
            .ok_or_else(|| ServiceError::invalid_field("price"))?;

        Ok(OrderDetails {
            product_title,
            size,
            quantity,
            price,
            total_amount,
            full_name: required_text(self.full_name, "full_name", 200)?,
            mobile: required_text(self.mobile, "mobile", 15)?,
            country_code: required_text(self.country_code, "country_code", 5)?,
            pin_code: required_text(self.pin_code, "pin_code", 10)?,
            state: required_text(self.state, "state", 100)?,
            city: required_text(self.city, "city", 100)?,
            house_flat_no: required_text(self.house_flat_no, "house_flat_no", 100)?,
            street_locality: required_text(self.street_locality, "street_locality", 200)?,
        })
    }
}

/// Success body of both checkout paths.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderPlacedResponse {
    pub success: bool,
    pub message: String,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_message_sid: Option<String>,
    /// Present when the order was stored but the notification could not be sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn complete() -> Value {
        json!({
            "product_title": "Polo",
            "size": "M",
            "quantity": "2",
            "price": 399.0,
            "full_name": "Asha Rao",
            "mobile": 9876543210u64,
            "country_code": "+91",
            "pin_code": "560001",
            "state": "Karnataka",
            "city": "Bengaluru",
            "house_flat_no": "12B",
            "street_locality": "MG Road"
        })
    }

    #[test]
    fn complete_request_is_accepted() {
        let req: OrderRequest = serde_json::from_value(complete()).unwrap();
        let details = req.into_details().unwrap();
        assert_eq!(details.quantity, 2);
        assert_eq!(details.price, dec!(399.00));
        assert_eq!(details.total_amount, dec!(798.00));
        assert!(MAX_ORDER_AMOUNT == dec!(99999999.99));
        assert_eq!(details.mobile, "9876543210");
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut body = complete();
        body["city"] = json!("");
        body["pin_code"] = Value::Null;
        let req: OrderRequest = serde_json::from_value(body).unwrap();
        let err = req.into_details().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: pin_code");
    }

    #[test]
    fn zero_quantity_counts_as_missing() {
        let mut body = complete();
        body["quantity"] = json!(0);
        let req: OrderRequest = serde_json::from_value(body).unwrap();
        assert_eq!(
            req.into_details().unwrap_err().to_string(),
            "Missing required field: quantity"
        );
    }

    #[test]
    fn negative_price_is_invalid() {
        let mut body = complete();
        body["price"] = json!("-5");
        let req: OrderRequest = serde_json::from_value(body).unwrap();
        assert_eq!(
            req.into_details().unwrap_err().to_string(),
            "Invalid value for field: price"
        );
    }

    #[test]
    fn overflowing_total_is_invalid() {
        let mut body = complete();
        body["price"] = json!("79228162514264337593543950335");
        let req: OrderRequest = serde_json::from_value(body).unwrap();
        assert_eq!(
            req.into_details().unwrap_err().to_string(),
            "Invalid value for field: price"
        );

        let mut body = complete();
        body["price"] = json!("60000000");
        let req: OrderRequest = serde_json::from_value(body).unwrap();
        assert_eq!(
            req.into_details().unwrap_err().to_string(),
            "Invalid value for field: price"
        );
    }

    #[test]
    fn text_longer_than_its_column_is_invalid() {
        let mut body = complete();
        body["mobile"] = json!("+91 98765 43210 99");
        let req: OrderRequest = serde_json::from_value(body).unwrap();
        assert_eq!(
            req.into_details().unwrap_err().to_string(),
            "Invalid value for field: mobile"
        );

        let mut body = complete();
        body["country_code"] = json!("+91-IND");
        let req: OrderRequest = serde_json::from_value(body).unwrap();
        assert_eq!(
            req.into_details().unwrap_err().to_string(),
            "Invalid value for field: country_code"
        );
    }

    #[test]
    fn payment_mode_detection_ignores_case() {
        let req = OrderRequest {
            payment_mode: Some("online".into()),
            ..Default::default()
        };
        assert!(req.wants_online_payment());
        assert!(!OrderRequest::default().wants_online_payment());
    }
}
