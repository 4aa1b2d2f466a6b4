#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use apparel_storefront::{
    build_router,
    config::AppConfig,
    db,
    entities::order,
    services::{
        notifications::{NotificationError, OrderNotifier},
        payment_gateway::{expected_signature, RazorpayGateway},
    },
    AppState,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_KEY_ID: &str = "rzp_test_key";
pub const TEST_KEY_SECRET: &str = "test_secret";

/// Notifier double that answers every call with a fixed outcome.
#[derive(Clone)]
pub struct ScriptedNotifier {
    fail_with: Option<String>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedNotifier {
    pub fn succeeding() -> Self {
        Self {
            fail_with: None,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Order ids a notification was attempted for.
    pub fn attempts(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderNotifier for ScriptedNotifier {
    async fn send_order_notification(
        &self,
        order: &order::Model,
    ) -> Result<String, NotificationError> {
        self.sent.lock().unwrap().push(order.order_id.clone());
        match &self.fail_with {
            Some(reason) => Err(NotificationError::Transport(reason.clone())),
            None => Ok(format!("SM{}", order.order_id)),
        }
    }
}

pub struct TestOptions {
    pub notifier: ScriptedNotifier,
    /// `None` leaves the gateway unconfigured
    pub razorpay_credentials: Option<(String, String)>,
    pub razorpay_base_url: String,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            notifier: ScriptedNotifier::succeeding(),
            razorpay_credentials: Some((TEST_KEY_ID.to_string(), TEST_KEY_SECRET.to_string())),
            razorpay_base_url: "http://127.0.0.1:9".to_string(),
        }
    }
}

/// Router over a throwaway SQLite file and media directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub notifier: ScriptedNotifier,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_000,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.media_root = dir.path().join("media");
        cfg.razorpay_base_url = options.razorpay_base_url;
        if let Some((key_id, secret)) = options.razorpay_credentials {
            cfg.razorpay_key_id = Some(key_id);
            cfg.razorpay_key_secret = Some(secret);
        }

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let gateway = RazorpayGateway::new(cfg.gateway()).expect("gateway client");
        let state = AppState::new(
            Arc::new(pool),
            cfg,
            Arc::new(gateway),
            Arc::new(options.notifier.clone()),
        );
        let router = build_router(state.clone());

        Self {
            router,
            state,
            notifier: options.notifier,
            _dir: dir,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Send a fully built request (custom headers or raw bodies).
    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn order_count(&self) -> u64 {
        order::Entity::find()
            .count(&*self.state.db)
            .await
            .expect("count orders")
    }

    pub async fn find_order(&self, order_id: &str) -> order::Model {
        use sea_orm::{ColumnTrait, QueryFilter};
        order::Entity::find()
            .filter(order::Column::OrderId.eq(order_id))
            .one(&*self.state.db)
            .await
            .expect("query order")
            .expect("order stored")
    }

    pub fn media_root(&self) -> std::path::PathBuf {
        self.state.config.media_root.clone()
    }
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("body is json")
}

/// A complete checkout form.
pub fn order_form() -> Value {
    json!({
        "product_title": "Classic Polo",
        "size": "M",
        "quantity": 2,
        "price": "399.00",
        "full_name": "Asha Rao",
        "mobile": "9876543210",
        "country_code": "+91",
        "pin_code": "560001",
        "state": "Karnataka",
        "city": "Bengaluru",
        "house_flat_no": "12B",
        "street_locality": "MG Road"
    })
}

/// Verification payload signed with [`TEST_KEY_SECRET`].
pub fn signed_verification(order_data: Value) -> Value {
    let signature = expected_signature("order_NvXf1", "pay_Qz8k2", TEST_KEY_SECRET);
    json!({
        "razorpay_order_id": "order_NvXf1",
        "razorpay_payment_id": "pay_Qz8k2",
        "razorpay_signature": signature,
        "order_data": order_data
    })
}
