// Each test binary exercises a different slice of the harness.
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;

use checkout_api::{
    app_router,
    config::AppConfig,
    db,
    entities::{order, order_item},
    gateway::{
        webhook::sign_payload, CreateSessionRequest, GatewayError, GatewaySession, PaymentGateway,
    },
    services::InMemoryLastOrderStore,
    AppState,
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_signing_secret";

/// Gateway double that records every request and answers with a canned
/// session, or with a rejection when one is staged via [`MockGateway::fail_with`].
#[derive(Default)]
pub struct MockGateway {
    requests: Mutex<Vec<CreateSessionRequest>>,
    rejection: Mutex<Option<String>>,
    counter: AtomicU64,
}

impl MockGateway {
    pub fn requests(&self) -> Vec<CreateSessionRequest> {
        self.requests.lock().expect("gateway mutex poisoned").clone()
    }

    pub fn last_request(&self) -> CreateSessionRequest {
        self.requests()
            .pop()
            .expect("no gateway request was recorded")
    }

    pub fn fail_with(&self, message: &str) {
        *self.rejection.lock().expect("gateway mutex poisoned") = Some(message.to_string());
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError> {
        if let Some(message) = self.rejection.lock().expect("gateway mutex poisoned").clone() {
            return Err(GatewayError::Rejected(message));
        }
        self.requests
            .lock()
            .expect("gateway mutex poisoned")
            .push(request);
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(GatewaySession {
            id: format!("cs_test_{n}"),
            url: format!("https://checkout.test/pay/cs_test_{n}"),
        })
    }
}

/// Helper harness spinning up the full router against an in-memory
/// SQLite database and a mock payment gateway.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub gateway: Arc<MockGateway>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
            "sk_test_key_for_tests".to_string(),
        );
        // In-memory SQLite gives each pooled connection its own database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.stripe_webhook_secret = Some(TEST_WEBHOOK_SECRET.to_string());

        let pool = db::establish_connection(&cfg)
            .await
            .expect("failed to create test database");
        db::ensure_schema(&pool)
            .await
            .expect("failed to create schema in tests");

        let gateway = Arc::new(MockGateway::default());
        let state = AppState {
            db: Arc::new(pool),
            config: cfg,
            gateway: gateway.clone(),
            last_orders: Arc::new(InMemoryLastOrderStore::new()),
        };
        let router = app_router(state.clone());

        Self {
            router,
            state,
            gateway,
        }
    }

    /// Harness without a configured webhook signing secret.
    pub async fn without_webhook_secret() -> Self {
        let app = Self::new().await;
        let mut state = app.state.clone();
        state.config.stripe_webhook_secret = None;
        let router = app_router(state.clone());
        Self {
            router,
            state,
            gateway: app.gateway,
        }
    }

    /// Insert an order row. Items are `(name, unit_price, quantity)`; pass
    /// `None` for price or quantity to seed the corresponding column as NULL.
    pub async fn seed_order(
        &self,
        id: i64,
        paid: bool,
        discount: Decimal,
        total: Decimal,
        items: &[(&str, Option<Decimal>, Option<i32>)],
    ) {
        let db = &*self.state.db;
        order::ActiveModel {
            id: Set(id),
            first_name: Set("Ada".to_string()),
            last_name: Set("Lovelace".to_string()),
            email: Set("ada@example.com".to_string()),
            address: Set("12 Analytical Way".to_string()),
            postal_code: Set("10115".to_string()),
            city: Set("Berlin".to_string()),
            paid: Set(paid),
            discount: Set(discount),
            total: Set(total),
            coupon_id: Set(None),
            stripe_id: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .expect("seed order");

        for (idx, (name, price, quantity)) in items.iter().enumerate() {
            order_item::ActiveModel {
                id: Set(id * 100 + idx as i64),
                order_id: Set(id),
                product_id: Set(1000 + idx as i64),
                product_name: Set(name.to_string()),
                price: Set(*price),
                quantity: Set(*quantity),
            }
            .insert(db)
            .await
            .expect("seed order item");
        }
    }

    /// JSON request against the router; returns status and parsed body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Deliver a signed webhook payload, as the provider would.
    pub async fn deliver_webhook(&self, payload: &str) -> (StatusCode, Value) {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_payload(payload.as_bytes(), &timestamp, TEST_WEBHOOK_SECRET);
        self.deliver_webhook_raw(payload, &format!("t={timestamp},v1={signature}"))
            .await
    }

    /// Deliver a webhook payload with an arbitrary signature header.
    pub async fn deliver_webhook_raw(
        &self,
        payload: &str,
        signature_header: &str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/webhook/payment")
            .header("content-type", "application/json")
            .header("stripe-signature", signature_header)
            .body(Body::from(payload.to_string()))
            .expect("build webhook request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during webhook delivery");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read webhook response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

/// Checkout-session-completed payload carrying an order id in metadata.
pub fn completed_event_payload(order_id: &str) -> String {
    serde_json::json!({
        "id": "evt_test_1",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_0",
                "metadata": { "order_id": order_id }
            }
        }
    })
    .to_string()
}
