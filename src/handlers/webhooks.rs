use crate::errors::ServiceError;
use crate::gateway::webhook::{self, WebhookError};
use crate::handlers::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode};
use tracing::{info, warn};

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Payment confirmation webhook
///
/// Verifies the notification signature, then applies the idempotent paid
/// transition. Anything the handler cannot act on after verification
/// (unknown or malformed order id, already-paid order) is acknowledged with
/// 200 so the at-least-once channel stops redelivering; every swallow is
/// logged.
#[utoipa::path(
    post,
    path = "/webhook/payment",
    request_body = String,
    responses(
        (status = 200, description = "Accepted or safely ignored"),
        (status = 400, description = "Signature or parse failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ServiceError> {
    let Some(secret) = state.config.stripe_webhook_secret.as_deref().filter(|s| !s.is_empty())
    else {
        warn!("payment webhook received but no webhook secret is configured");
        return Err(ServiceError::BadRequest(
            "webhook secret not configured".to_string(),
        ));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let event = match webhook::verify_and_parse(
        &body,
        signature,
        secret,
        state.config.webhook_tolerance_secs,
    ) {
        Ok(event) => event,
        Err(WebhookError::InvalidSignature) => {
            // Potential security event: an unauthenticated party is poking
            // the confirmation channel.
            warn!("payment webhook signature verification failed");
            return Err(ServiceError::AuthenticationError(
                "invalid webhook signature".to_string(),
            ));
        }
        Err(WebhookError::MalformedPayload(detail)) => {
            return Err(ServiceError::BadRequest(format!(
                "invalid webhook payload: {detail}"
            )));
        }
    };

    if !event.kind.confirms_payment() {
        info!(kind = ?event.kind, "ignoring unhandled payment webhook kind");
        return Ok(StatusCode::OK);
    }

    match event.order_id().map(str::parse::<i64>) {
        Some(Ok(order_id)) => match state.order_service().mark_paid(order_id).await {
            Ok(true) => info!(order_id, "payment confirmed"),
            // Duplicate delivery or unknown id; the transition already
            // happened or never will. Either way, a no-op.
            Ok(false) => info!(order_id, "no unpaid order matched confirmation"),
            Err(e) => warn!(order_id, error = %e, "failed to apply paid transition"),
        },
        Some(Err(_)) => warn!("payment confirmation carried a malformed order id"),
        None => warn!("payment confirmation carried no order id"),
    }

    Ok(StatusCode::OK)
}
