use std::sync::Arc;

use crate::{
    db::DbPool,
    dto::apparel::{ChoiceOption, ProductResponse, ProductWriteRequest},
    entities::apparel_product::{
        self, validate_size_list, Category, Column as ProductColumn, Entity as Product,
        ProductStatus, Size,
    },
    errors::ServiceError,
    services::image_normalizer::{ImageNormalizer, ImageUpload},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use tracing::{error, info, instrument};
use validator::Validate;

pub const NOT_FOUND_MESSAGE: &str = "Not found.";

/// How an update treats fields absent from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// PUT: title and price must be supplied
    Full,
    /// PATCH: any subset
    Partial,
}

/// Product catalog backed by the `apparel_products` table.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    images: ImageNormalizer,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, images: ImageNormalizer) -> Self {
        Self { db_pool, images }
    }

    fn to_response(&self, model: apparel_product::Model) -> ProductResponse {
        ProductResponse::from_model(model, |reference| self.images.image_url(reference))
    }

    /// Active products, newest first. `ALL`, blank or absent means unfiltered;
    /// an unknown category yields an empty list.
    #[instrument(skip(self))]
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<ProductResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = Product::find().filter(ProductColumn::IsActive.eq(true));
        match category.map(str::trim).filter(|c| !c.is_empty()) {
            None => {}
            Some(c) if c.eq_ignore_ascii_case("ALL") => {}
            Some(c) => match c.parse::<Category>() {
                Ok(category) => query = query.filter(ProductColumn::Category.eq(category)),
                Err(()) => return Ok(Vec::new()),
            },
        }

        let products = query
            .order_by_desc(ProductColumn::CreatedAt)
            .order_by_desc(ProductColumn::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error when listing products");
                ServiceError::DatabaseError(e)
            })?;

        Ok(products.into_iter().map(|p| self.to_response(p)).collect())
    }

    /// A single active product.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<ProductResponse, ServiceError> {
        let product = self.find_active(id).await?;
        Ok(self.to_response(product))
    }

    #[instrument(skip(self, request), fields(title = request.title.as_deref().unwrap_or("")))]
    pub async fn create(&self, request: ProductWriteRequest) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        let title = required_title(request.title.as_deref())?;
        let price = match request.price {
            Some(price) => positive_price(price)?,
            None => return Err(ServiceError::ValidationError("Price is required.".to_string())),
        };
        let category = match request.category.as_deref() {
            Some(raw) => parse_category(raw)?,
            None => Category::Male,
        };
        let status = match request.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => ProductStatus::Available,
        };
        let sizes = match request.sizes {
            Some(sizes) => checked_sizes(sizes)?,
            None => Value::Array(Vec::new()),
        };

        let image = match upload_of(&request.image_data, &request.image_filename) {
            Some(upload) => Some(self.images.store(&title, category, &upload).await?),
            None => None,
        };

        let product = apparel_product::ActiveModel {
            title: Set(title),
            description: Set(request.description.unwrap_or_default()),
            image: Set(image.clone()),
            category: Set(category),
            sizes: Set(sizes),
            price: Set(price),
            status: Set(status),
            whatsapp_message: Set(request.whatsapp_message.unwrap_or_default()),
            is_active: Set(request.is_active.unwrap_or(true)),
            ..Default::default()
        };

        let created = match product.insert(db).await {
            Ok(created) => created,
            Err(e) => {
                error!(error = %e, "Failed to create product");
                if let Some(reference) = image {
                    self.images.discard(&reference).await;
                }
                return Err(ServiceError::DatabaseError(e));
            }
        };

        info!(product_id = created.id, title = %created.title, "Product created");
        Ok(self.to_response(created))
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: ProductWriteRequest,
        mode: UpdateMode,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        let existing = self.find_active(id).await?;

        if mode == UpdateMode::Full {
            if request.title.is_none() {
                return Err(ServiceError::ValidationError("Title is required.".to_string()));
            }
            if request.price.is_none() {
                return Err(ServiceError::ValidationError("Price is required.".to_string()));
            }
        }

        let title = match request.title.as_deref() {
            Some(raw) => Some(required_title(Some(raw))?),
            None => None,
        };
        let price = request.price.map(positive_price).transpose()?;
        let category = request.category.as_deref().map(parse_category).transpose()?;
        let status = request.status.as_deref().map(parse_status).transpose()?;
        let sizes = request.sizes.map(checked_sizes).transpose()?;

        let image = match upload_of(&request.image_data, &request.image_filename) {
            Some(upload) => {
                let title = title.as_deref().unwrap_or(&existing.title);
                let category = category.unwrap_or(existing.category);
                Some(self.images.store(title, category, &upload).await?)
            }
            None => None,
        };

        let mut product = existing.into_active_model();
        if let Some(title) = title {
            product.title = Set(title);
        }
        if let Some(description) = request.description {
            product.description = Set(description);
        }
        if let Some(category) = category {
            product.category = Set(category);
        }
        if let Some(sizes) = sizes {
            product.sizes = Set(sizes);
        }
        if let Some(price) = price {
            product.price = Set(price);
        }
        if let Some(status) = status {
            product.status = Set(status);
        }
        if let Some(message) = request.whatsapp_message {
            product.whatsapp_message = Set(message);
        }
        if let Some(is_active) = request.is_active {
            product.is_active = Set(is_active);
        }
        if image.is_some() {
            product.image = Set(image.clone());
        }

        let updated = match product.update(db).await {
            Ok(updated) => updated,
            Err(e) => {
                error!(product_id = id, error = %e, "Failed to update product");
                if let Some(reference) = image {
                    self.images.discard(&reference).await;
                }
                return Err(ServiceError::DatabaseError(e));
            }
        };

        info!(product_id = updated.id, "Product updated");
        Ok(self.to_response(updated))
    }

    /// Hides the product from the catalog; the row is kept.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let product = self.find_active(id).await?;
        let title = product.title.clone();

        let mut product = product.into_active_model();
        product.is_active = Set(false);
        product.update(db).await.map_err(|e| {
            error!(product_id = id, error = %e, "Failed to deactivate product");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = id, title = %title, "Product soft-deleted");
        Ok(())
    }

    pub fn categories(&self) -> Vec<ChoiceOption> {
        [Category::Male, Category::Female]
            .iter()
            .map(|c| ChoiceOption {
                value: c.code().to_string(),
                label: c.label().to_string(),
            })
            .collect()
    }

    pub fn sizes(&self) -> Vec<ChoiceOption> {
        Size::ALL
            .iter()
            .map(|s| ChoiceOption {
                value: s.code().to_string(),
                label: s.label().to_string(),
            })
            .collect()
    }

    async fn find_active(&self, id: i32) -> Result<apparel_product::Model, ServiceError> {
        let db = &*self.db_pool;
        Product::find_by_id(id)
            .filter(ProductColumn::IsActive.eq(true))
            .one(db)
            .await
            .map_err(|e| {
                error!(product_id = id, error = %e, "Database error when fetching product");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND_MESSAGE.to_string()))
    }
}

fn upload_of(data: &Option<String>, filename: &Option<String>) -> Option<ImageUpload> {
    data.as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| ImageUpload {
            data: d.to_string(),
            filename: filename.clone(),
        })
}

fn required_title(raw: Option<&str>) -> Result<String, ServiceError> {
    match raw.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(ServiceError::ValidationError(
            "Title cannot be empty.".to_string(),
        )),
    }
}

fn positive_price(price: Decimal) -> Result<Decimal, ServiceError> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Price must be greater than 0.".to_string(),
        ));
    }
    Ok(price.round_dp(2))
}

fn parse_category(raw: &str) -> Result<Category, ServiceError> {
    raw.parse::<Category>()
        .map_err(|_| ServiceError::ValidationError(format!("\"{}\" is not a valid category.", raw)))
}

fn parse_status(raw: &str) -> Result<ProductStatus, ServiceError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "AVAILABLE" => Ok(ProductStatus::Available),
        "OUT_OF_STOCK" => Ok(ProductStatus::OutOfStock),
        _ => Err(ServiceError::ValidationError(format!(
            "\"{}\" is not a valid status.",
            raw
        ))),
    }
}

fn checked_sizes(sizes: Value) -> Result<Value, ServiceError> {
    validate_size_list(&sizes).map_err(ServiceError::ValidationError)?;
    Ok(sizes)
}
