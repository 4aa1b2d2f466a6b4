use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dto::orders::{OrderPlacedResponse, OrderRequest},
    errors::ServiceError,
    handlers::JsonBody,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/orders/whatsapp/",
    summary = "Place cash-on-delivery order",
    description = "Stores a COD order and notifies the shop owner on WhatsApp. \
                   A failed notification is reported as a warning; the order is kept.",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderPlacedResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or invalid field", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn place_whatsapp_order(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<OrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let placed = state.order_intake.place_cod_order(payload).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}
