use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::gateway::GatewayError;

/// Error body returned on every non-2xx response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Bad Request")
    #[schema(example = "Bad Request")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Order not found or already paid.")]
    pub detail: String,
    /// ISO 8601 timestamp when the error occurred
    #[schema(example = "2024-12-09T10:30:00.000Z")]
    pub timestamp: String,
}

/// Service-level error taxonomy.
///
/// Checkout outcomes that are reportable business states rather than faults
/// (`NothingToCharge`, `PreconditionFailed`) get their own variants so that
/// callers and tests can distinguish them without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Order missing or already paid. Reported to the caller, not retried.
    #[error("Order not found or already paid.")]
    PreconditionFailed,

    /// No snapshot lines survived; there is nothing to build a session from.
    #[error("Order has no items.")]
    EmptyOrder,

    /// Every line was fully discounted away. A distinct, reportable state,
    /// not silently billed as zero.
    #[error("Nothing to charge after discount.")]
    NothingToCharge,

    /// The payment provider rejected the session request; carries the
    /// provider detail. Not retried automatically.
    #[error("Payment gateway error: {0}")]
    GatewayError(String),

    /// Webhook signature rejected. Logged as a potential security event at
    /// the call site.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected(msg) => Self::GatewayError(msg),
            GatewayError::Transport(msg) => Self::GatewayError(msg),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::PreconditionFailed
            | Self::EmptyOrder
            | Self::NothingToCharge
            | Self::GatewayError(_)
            | Self::AuthenticationError(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message suitable for HTTP responses. Internal faults return a generic
    /// message to avoid leaking implementation detail.
    pub fn response_detail(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            detail: self.response_detail(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}
