use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    dto::apparel::{ChoiceOption, ProductListQuery, ProductResponse, ProductWriteRequest},
    errors::ServiceError,
    handlers::JsonBody,
    services::catalog::UpdateMode,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/apparel/",
    summary = "List products",
    description = "Active products, newest first, optionally filtered by category",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products retrieved", body = Vec<ProductResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ServiceError> {
    let products = state.catalog.list(query.category.as_deref()).await?;
    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/apparel/",
    summary = "Create product",
    request_body = ProductWriteRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ProductWriteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.catalog.create(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/apparel/{id}/",
    summary = "Get product",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product retrieved", body = ProductResponse),
        (status = 404, description = "Product not found or inactive", body = crate::errors::ErrorResponse),
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, ServiceError> {
    Ok(Json(state.catalog.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/apparel/{id}/",
    summary = "Replace product",
    description = "Full update; title and price are required",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ProductWriteRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found or inactive", body = crate::errors::ErrorResponse),
    ),
    tag = "Catalog"
)]
pub async fn replace_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<ProductWriteRequest>,
) -> Result<Json<ProductResponse>, ServiceError> {
    let product = state.catalog.update(id, payload, UpdateMode::Full).await?;
    Ok(Json(product))
}

#[utoipa::path(
    patch,
    path = "/api/apparel/{id}/",
    summary = "Update product",
    description = "Partial update; only supplied fields change",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ProductWriteRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found or inactive", body = crate::errors::ErrorResponse),
    ),
    tag = "Catalog"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<ProductWriteRequest>,
) -> Result<Json<ProductResponse>, ServiceError> {
    let product = state
        .catalog
        .update(id, payload, UpdateMode::Partial)
        .await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/apparel/{id}/",
    summary = "Delete product",
    description = "Soft delete: the product stops being listed",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 404, description = "Product not found or inactive", body = crate::errors::ErrorResponse),
    ),
    tag = "Catalog"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.catalog.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/apparel/categories/",
    summary = "List categories",
    responses((status = 200, description = "Category choices", body = Vec<ChoiceOption>)),
    tag = "Catalog"
)]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<ChoiceOption>> {
    Json(state.catalog.categories())
}

#[utoipa::path(
    get,
    path = "/api/apparel/sizes/",
    summary = "List sizes",
    responses((status = 200, description = "Size choices", body = Vec<ChoiceOption>)),
    tag = "Catalog"
)]
pub async fn list_sizes(State(state): State<AppState>) -> Json<Vec<ChoiceOption>> {
    Json(state.catalog.sizes())
}
