use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::apparel_product::{self, Category, ProductStatus};

/// Product as returned by the catalog endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Stored image reference relative to the media root
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub category: Category,
    pub category_display: String,
    pub sizes: Vec<String>,
    #[schema(value_type = String, example = "399.00")]
    pub price: Decimal,
    pub status: ProductStatus,
    pub status_display: String,
    pub status_color: String,
    pub whatsapp_message: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn from_model(model: apparel_product::Model, image_url: impl Fn(&str) -> String) -> Self {
        let mut price = model.price.round_dp(2);
        price.rescale(2);
        let sizes = model
            .size_codes()
            .iter()
            .map(|s| s.code().to_string())
            .collect();
        Self {
            id: model.id,
            image_url: model.image.as_deref().map(&image_url),
            image: model.image,
            title: model.title,
            description: model.description,
            category_display: model.category.label().to_string(),
            category: model.category,
            sizes,
            price,
            status_display: model.status.label().to_string(),
            status_color: model.status.badge_color().to_string(),
            status: model.status,
            whatsapp_message: model.whatsapp_message,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Body for create (POST), full update (PUT) and partial update (PATCH).
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ProductWriteRequest {
    #[validate(length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    pub title: Option<String>,
    pub description: Option<String>,
    /// `MALE` or `FEMALE`, case-insensitive
    pub category: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub sizes: Option<Value>,
    #[serde(default, alias = "mrp_price")]
    #[schema(value_type = Option<String>, example = "399.00")]
    pub price: Option<Decimal>,
    /// `AVAILABLE` or `OUT_OF_STOCK`
    pub status: Option<String>,
    pub whatsapp_message: Option<String>,
    pub is_active: Option<bool>,
    /// Base64 image (optionally a `data:` URL); normalized to JPEG on save
    pub image_data: Option<String>,
    /// Original file name, used for the extension check
    pub image_filename: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// `MALE`, `FEMALE` or `ALL` (case-insensitive)
    pub category: Option<String>,
}

/// Value/label pair for client-side pickers.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}
