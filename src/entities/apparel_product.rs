use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Catalog product
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "apparel_products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Path relative to the media root, e.g. `apparel/Polo_MALE.jpg`
    pub image: Option<String>,

    pub category: Category,

    /// JSON array of size codes
    #[sea_orm(column_type = "Json")]
    pub sizes: Json,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,

    pub status: ProductStatus,

    /// Pre-filled message for the storefront's "order on WhatsApp" button
    #[sea_orm(column_type = "Text")]
    pub whatsapp_message: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Size codes in stored order; unknown entries are skipped.
    pub fn size_codes(&self) -> Vec<Size> {
        self.sizes
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter_map(|s| s.parse().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// Default contact message for a product with the given title.
pub fn default_whatsapp_message(title: &str) -> String {
    format!("Hello! I would like to order {}.", title)
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.is_active {
                active_model.is_active = Set(true);
            }
            if let ActiveValue::NotSet = active_model.status {
                active_model.status = Set(ProductStatus::Available);
            }
            if let ActiveValue::NotSet = active_model.category {
                active_model.category = Set(Category::Male);
            }
            if let ActiveValue::NotSet = active_model.description {
                active_model.description = Set(String::new());
            }
            if let ActiveValue::NotSet = active_model.sizes {
                active_model.sizes = Set(Json::Array(Vec::new()));
            }
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        // The model only requires a non-negative price; the API is stricter.
        if let Some(price) = active_model.price.try_as_ref() {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(DbErr::Custom("price must not be negative".to_string()));
            }
            let rounded = price.round_dp(2);
            if rounded != *price {
                active_model.price = Set(rounded);
            }
        }

        if let Some(sizes) = active_model.sizes.try_as_ref() {
            validate_size_list(sizes).map_err(DbErr::Custom)?;
        }

        let blank_message = match active_model.whatsapp_message.try_as_ref() {
            Some(message) => message.trim().is_empty(),
            None => true,
        };
        if blank_message {
            if let Some(title) = active_model.title.try_as_ref() {
                active_model.whatsapp_message = Set(default_whatsapp_message(title));
            }
        }

        Ok(active_model)
    }
}

/// Checks that `sizes` is a JSON array of recognised size codes.
pub fn validate_size_list(sizes: &Json) -> Result<(), String> {
    let items = sizes
        .as_array()
        .ok_or_else(|| "Sizes must be a list.".to_string())?;
    for item in items {
        let code = item.as_str().unwrap_or_default();
        if code.parse::<Size>().is_err() {
            let display = item
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| item.to_string());
            return Err(format!(
                "Invalid size '{}'. Must be one of: {}",
                display,
                Size::codes().join(", ")
            ));
        }
    }
    Ok(())
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    #[sea_orm(string_value = "MALE")]
    Male,
    #[sea_orm(string_value = "FEMALE")]
    Female,
}

impl Category {
    pub fn code(&self) -> &'static str {
        match self {
            Category::Male => "MALE",
            Category::Female => "FEMALE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Male => "Male",
            Category::Female => "Female",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Category::Male),
            "FEMALE" => Ok(Category::Female),
            _ => Err(()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[sea_orm(string_value = "AVAILABLE")]
    Available,
    #[sea_orm(string_value = "OUT_OF_STOCK")]
    OutOfStock,
}

impl ProductStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProductStatus::Available => "Available Now",
            ProductStatus::OutOfStock => "Out of Stock",
        }
    }

    /// Badge class used by the storefront
    pub fn badge_color(&self) -> &'static str {
        match self {
            ProductStatus::Available => "bg-green-500",
            ProductStatus::OutOfStock => "bg-red-500",
        }
    }
}

/// Garment size. Stored as its code inside the product's JSON size list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Size {
    S,
    M,
    L,
    XL,
    XXL,
}

impl Size {
    pub const ALL: [Size; 5] = [Size::S, Size::M, Size::L, Size::XL, Size::XXL];

    pub fn code(&self) -> &'static str {
        match self {
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::XL => "XL",
            Size::XXL => "XXL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Size::S => "Small",
            Size::M => "Medium",
            Size::L => "Large",
            Size::XL => "Extra Large",
            Size::XXL => "Double Extra Large",
        }
    }

    pub fn codes() -> Vec<&'static str> {
        Self::ALL.iter().map(Size::code).collect()
    }
}

impl FromStr for Size {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Size::ALL.into_iter().find(|size| size.code() == s).ok_or(())
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_parsing_is_case_insensitive() {
        assert_eq!("male".parse::<Category>(), Ok(Category::Male));
        assert_eq!(" Female ".parse::<Category>(), Ok(Category::Female));
        assert!("ALL".parse::<Category>().is_err());
    }

    #[test]
    fn size_list_rejects_unknown_codes() {
        assert!(validate_size_list(&json!(["S", "XXL"])).is_ok());
        assert!(validate_size_list(&json!([])).is_ok());

        let err = validate_size_list(&json!(["S", "XS"])).unwrap_err();
        assert_eq!(err, "Invalid size 'XS'. Must be one of: S, M, L, XL, XXL");

        // codes are case-sensitive
        assert!(validate_size_list(&json!(["m"])).is_err());
        assert_eq!(
            validate_size_list(&json!("S,M")).unwrap_err(),
            "Sizes must be a list."
        );
    }

    #[test]
    fn status_presentation() {
        assert_eq!(ProductStatus::Available.badge_color(), "bg-green-500");
        assert_eq!(ProductStatus::OutOfStock.badge_color(), "bg-red-500");
        assert_eq!(ProductStatus::OutOfStock.label(), "Out of Stock");
        assert_eq!(
            serde_json::to_value(ProductStatus::OutOfStock).unwrap(),
            json!("OUT_OF_STOCK")
        );
    }

    #[test]
    fn default_message_uses_title() {
        assert_eq!(
            default_whatsapp_message("Polo"),
            "Hello! I would like to order Polo."
        );
    }
}
