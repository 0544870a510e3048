//! Payment gateway collaborator.
//!
//! The gateway client is constructed explicitly at startup and injected into
//! the checkout service through [`PaymentGateway`]; there is no process-wide
//! gateway configuration.

pub mod stripe;
pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;

pub use stripe::StripeGateway;

/// One gateway-side line item. A single order line may expand into up to two
/// of these when its net total does not divide evenly by its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayLineItem {
    pub quantity: i64,
    pub unit_amount_cents: i64,
    pub currency: String,
    pub display_name: String,
}

/// Metadata attached to the gateway session; echoed back verbatim in the
/// confirmation notification, which is where the order id is read from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionMetadata {
    pub order_id: String,
    pub session_key: String,
    pub user_id: String,
    pub email: String,
}

/// Everything the gateway needs to create a checkout session.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub line_items: Vec<GatewayLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub client_reference_id: String,
    pub metadata: SessionMetadata,
}

/// Gateway-side session handle: the id we record on the order and the
/// redirect URL handed back to the caller.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The provider rejected the request; carries the provider's message.
    #[error("gateway rejected request: {0}")]
    Rejected(String),

    #[error("gateway transport error: {0}")]
    Transport(String),
}

/// External payment gateway session-creation operation. Failures are
/// surfaced to the caller, never retried automatically.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError>;
}
