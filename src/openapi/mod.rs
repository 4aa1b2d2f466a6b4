use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Apparel Storefront API",
        version = "1.0.0",
        description = r#"
# Apparel Storefront API

Backend for a small apparel shop: product catalog, cash-on-delivery orders
announced to the owner over WhatsApp, and online payments through Razorpay.

## Checkout flows

- **Cash on delivery**: `POST /api/orders/whatsapp/` stores the order and
  notifies the owner.
- **Online**: `POST /api/payments/create-order/` opens a gateway order; after
  checkout the client posts the gateway callback to
  `POST /api/payments/verify/`, which stores the order only when the signature
  is valid.

A failed WhatsApp notification never fails an order; the response carries a
`warning` instead.

## Error Handling

```json
{
  "error": "Missing required field: pin_code",
  "request_id": "7d3f0c7e-4b7a-4bde-9a43-d1f1e2a8c001",
  "timestamp": "2025-01-05T10:30:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development")
    ),
    tags(
        (name = "Catalog", description = "Apparel products and discovery endpoints"),
        (name = "Orders", description = "Cash-on-delivery checkout"),
        (name = "Payments", description = "Online payment checkout"),
        (name = "Health", description = "Service health")
    ),
    paths(
        crate::handlers::apparel::list_products,
        crate::handlers::apparel::create_product,
        crate::handlers::apparel::get_product,
        crate::handlers::apparel::replace_product,
        crate::handlers::apparel::update_product,
        crate::handlers::apparel::delete_product,
        crate::handlers::apparel::list_categories,
        crate::handlers::apparel::list_sizes,
        crate::handlers::orders::place_whatsapp_order,
        crate::handlers::payments::create_payment_order,
        crate::handlers::payments::verify_payment,
        crate::health::health_check,
    ),
    components(
        schemas(
            crate::dto::apparel::ProductResponse,
            crate::dto::apparel::ProductWriteRequest,
            crate::dto::apparel::ChoiceOption,
            crate::dto::orders::OrderRequest,
            crate::dto::orders::OrderPlacedResponse,
            crate::dto::payments::CreatePaymentOrderRequest,
            crate::dto::payments::PaymentOrderResponse,
            crate::dto::payments::VerifyPaymentRequest,
            crate::entities::Category,
            crate::entities::ProductStatus,
            crate::entities::OrderStatus,
            crate::entities::PaymentStatus,
            crate::entities::PaymentMode,
            crate::health::HealthResponse,
            crate::health::HealthStatus,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
