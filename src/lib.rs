//! Apparel Storefront API Library
//!
//! Catalog, cash-on-delivery checkout and verified online checkout for a small
//! apparel shop, served over axum.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod telemetry;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    timeout::TimeoutLayer,
};
use tracing::warn;

use crate::errors::ServiceError;
use crate::services::{
    catalog::CatalogService,
    image_normalizer::ImageNormalizer,
    notifications::{OrderNotifier, TwilioWhatsAppNotifier},
    order_intake::OrderIntakeService,
    payment_gateway::{PaymentGateway, RazorpayGateway},
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub catalog: CatalogService,
    pub order_intake: OrderIntakeService,
}

impl AppState {
    /// Wires services around the given adapters.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        let catalog = CatalogService::new(db.clone(), ImageNormalizer::new(config.media()));
        let order_intake = OrderIntakeService::new(db.clone(), gateway, notifier);
        Self {
            db,
            config,
            catalog,
            order_intake,
        }
    }

    /// Production wiring: Razorpay and Twilio adapters built from configuration.
    pub fn from_config(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
    ) -> Result<Self, ServiceError> {
        let gateway = Arc::new(RazorpayGateway::new(config.gateway())?);
        let notifier = Arc::new(TwilioWhatsAppNotifier::new(config.messaging()).map_err(|e| {
            ServiceError::InternalError(format!("failed to build messaging client: {}", e))
        })?);
        Ok(Self::new(db, config, gateway, notifier))
    }
}

/// Storefront routes, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    let apparel = Router::new()
        .route(
            "/apparel/",
            get(handlers::apparel::list_products).post(handlers::apparel::create_product),
        )
        .route("/apparel/categories/", get(handlers::apparel::list_categories))
        .route("/apparel/sizes/", get(handlers::apparel::list_sizes))
        .route(
            "/apparel/:id/",
            get(handlers::apparel::get_product)
                .put(handlers::apparel::replace_product)
                .patch(handlers::apparel::update_product)
                .delete(handlers::apparel::delete_product),
        );

    let checkout = Router::new()
        .route("/orders/whatsapp/", post(handlers::orders::place_whatsapp_order))
        .route(
            "/payments/create-order/",
            post(handlers::payments::create_payment_order),
        )
        .route("/payments/verify/", post(handlers::payments::verify_payment));

    apparel.merge(checkout)
}

fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // wildcard methods/headers cannot be combined with credentials
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(middleware_helpers::request_id::REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(
            middleware_helpers::request_id::REQUEST_ID_HEADER,
        )])
        .allow_credentials(true)
}

/// Full application router: API, health, docs and the middleware stack.
pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config);
    // base64 inflates uploads by a third; leave room for the other fields
    let body_limit = state.config.max_image_bytes / 3 * 4 + 64 * 1024;

    Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes().layer(DefaultBodyLimit::max(body_limit)))
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(telemetry::configure_http_tracing())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
