use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placed order. Product fields are a snapshot taken at checkout and never
/// joined back to the live catalog.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub order_id: String,

    pub product_title: String,
    pub size: String,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_amount: Decimal,

    pub full_name: String,
    pub mobile: String,
    pub country_code: String,

    pub house_flat_no: String,
    pub street_locality: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,

    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,

    pub order_status: OrderStatus,

    /// Provider id of the notification message, set only once it was sent
    pub whatsapp_message_sid: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        } else if active_model.razorpay_order_id.is_set()
            || active_model.razorpay_payment_id.is_set()
            || active_model.razorpay_signature.is_set()
        {
            return Err(DbErr::Custom(
                "gateway identifiers are immutable once an order is stored".to_string(),
            ));
        }
        active_model.updated_at = Set(now);

        let needs_total = match active_model.total_amount.try_as_ref() {
            None => true,
            Some(total) => total.is_zero(),
        };
        if needs_total {
            if let (Some(price), Some(quantity)) = (
                active_model.price.try_as_ref(),
                active_model.quantity.try_as_ref(),
            ) {
                let total = line_total(*price, *quantity)
                    .ok_or_else(|| DbErr::Custom("order total overflows".to_string()))?;
                active_model.total_amount = Set(total);
            }
        }

        if let ActiveValue::NotSet = active_model.country_code {
            active_model.country_code = Set(DEFAULT_COUNTRY_CODE.to_string());
        }

        Ok(active_model)
    }
}

pub const DEFAULT_COUNTRY_CODE: &str = "+91";

/// `price × quantity`, rounded to paise. `None` when the product overflows.
pub fn line_total(price: Decimal, quantity: i32) -> Option<Decimal> {
    price
        .checked_mul(Decimal::from(quantity))
        .map(|total| total.round_dp(2))
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    #[sea_orm(string_value = "ONLINE")]
    Online,
    #[sea_orm(string_value = "COD")]
    Cod,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "REFUNDED")]
    Refunded,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_multiplies_and_rounds() {
        assert_eq!(line_total(dec!(399.00), 3), Some(dec!(1197.00)));
        assert_eq!(line_total(dec!(0.335), 1), Some(dec!(0.34)));
        assert_eq!(line_total(Decimal::MAX, 2), None);
    }

    #[test]
    fn enums_serialize_as_stored_codes() {
        assert_eq!(
            serde_json::to_value(PaymentMode::Cod).unwrap(),
            serde_json::json!("COD")
        );
        assert_eq!(
            serde_json::to_value(OrderStatus::Confirmed).unwrap(),
            serde_json::json!("CONFIRMED")
        );
        assert_eq!(
            serde_json::to_value(PaymentStatus::Completed).unwrap(),
            serde_json::json!("COMPLETED")
        );
    }
}
