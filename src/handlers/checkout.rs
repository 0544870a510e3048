use crate::checkout::CheckoutContext;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

/// Opaque caller-session header scoping the "last order" convenience store.
pub const SESSION_KEY_HEADER: &str = "x-session-key";

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateCheckoutSessionRequest {
    /// Order to check out. Falls back to the caller session's last order
    /// when absent.
    #[schema(example = 123)]
    pub order_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSessionResponse {
    /// Gateway-issued redirect URL
    #[schema(example = "https://checkout.stripe.com/c/pay/cs_test_123")]
    pub url: String,
}

/// Create a payment-gateway checkout session for an order
#[utoipa::path(
    post,
    path = "/checkout/session",
    request_body = CreateCheckoutSessionRequest,
    responses(
        (status = 201, description = "Session created", body = CheckoutSessionResponse),
        (status = 400, description = "Empty order, nothing to charge, precondition failed, or gateway error", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<CreateCheckoutSessionRequest>>,
) -> Result<(StatusCode, Json<CheckoutSessionResponse>), ServiceError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let session_key = headers
        .get(SESSION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let order_id = request
        .order_id
        .or_else(|| state.last_orders.recall(&session_key))
        .ok_or_else(|| ServiceError::ValidationError("No order provided.".to_string()))?;

    let ctx = CheckoutContext {
        session_key: session_key.clone(),
        user_id: None,
    };
    let result = state.checkout_service().create_session(order_id, &ctx).await;

    // Remember for the caller's thank-you flow as soon as the order is known
    // to exist and be unpaid, so the lookup works even when session creation
    // fails downstream.
    if !matches!(
        result,
        Err(ServiceError::PreconditionFailed | ServiceError::DatabaseError(_))
    ) {
        state.last_orders.remember(&session_key, order_id);
    }

    let outcome = result?;
    debug!(order_id = outcome.order_id, "checkout session issued");

    Ok((
        StatusCode::CREATED,
        Json(CheckoutSessionResponse { url: outcome.url }),
    ))
}
