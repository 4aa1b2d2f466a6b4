use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dto::{
        orders::OrderPlacedResponse,
        payments::{CreatePaymentOrderRequest, PaymentOrderResponse, VerifyPaymentRequest},
    },
    errors::ServiceError,
    handlers::JsonBody,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/payments/create-order/",
    summary = "Create gateway order",
    description = "Creates a Razorpay order for the checkout widget. Amount is in rupees; \
                   the response amount is in paise.",
    request_body = CreatePaymentOrderRequest,
    responses(
        (status = 201, description = "Gateway order created", body = PaymentOrderResponse),
        (status = 400, description = "Amount missing or invalid", body = crate::errors::ErrorResponse),
        (status = 500, description = "Gateway not configured or unavailable", body = crate::errors::ErrorResponse),
    ),
    tag = "Payments"
)]
pub async fn create_payment_order(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreatePaymentOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.order_intake.create_payment_order(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify/",
    summary = "Verify payment and place order",
    description = "Checks the checkout signature and stores the paid order. \
                   Nothing is stored when the signature does not match.",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 201, description = "Payment verified, order placed", body = OrderPlacedResponse),
        (status = 400, description = "Missing details or invalid signature", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let placed = state
        .order_intake
        .place_verified_online_order(payload)
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}
