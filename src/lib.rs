//! Checkout settlement backend.
//!
//! The surrounding shop application owns the catalog, cart, and order
//! creation; this crate owns the money-critical slice: recomputing order
//! totals from persisted data, allocating discounts with cent-level
//! precision, building an exactly-matching payment-gateway session, and
//! applying the idempotent paid transition when the gateway confirms.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod checkout;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod money;
pub mod openapi;
pub mod services;

use axum::{response::Json, routing::get, routing::post, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use checkout::CheckoutService;
use gateway::PaymentGateway;
use services::{LastOrderStore, OrderService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub gateway: Arc<dyn PaymentGateway>,
    pub last_orders: Arc<dyn LastOrderStore>,
}

impl AppState {
    pub fn order_service(&self) -> OrderService {
        OrderService::new(self.db.clone())
    }

    pub fn checkout_service(&self) -> CheckoutService {
        CheckoutService::new(
            self.order_service(),
            self.gateway.clone(),
            self.config.currency.clone(),
            self.config.frontend_base_url.clone(),
        )
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn openapi_json() -> Json<Value> {
    Json(json!(openapi::ApiDoc::openapi()))
}

/// Assembles the application router over the shared state.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/checkout/session",
            post(handlers::checkout::create_checkout_session),
        )
        .route("/webhook/payment", post(handlers::webhooks::payment_webhook))
        .route("/orders/last", get(handlers::orders::last_order))
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
