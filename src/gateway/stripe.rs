use super::{CreateSessionRequest, GatewayError, GatewaySession, PaymentGateway};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

const SESSIONS_PATH: &str = "/v1/checkout/sessions";

/// Stripe Checkout client speaking the form-encoded Sessions API.
///
/// Owned by the application state and injected where needed; the API key
/// lives here and nowhere else.
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl StripeGateway {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    /// Flattens the request into Stripe's bracketed form-field encoding.
    fn form_params(request: &CreateSessionRequest) -> Vec<(String, String)> {
        let mut params = vec![("mode".to_string(), "payment".to_string())];
        for (i, li) in request.line_items.iter().enumerate() {
            params.push((format!("line_items[{i}][quantity]"), li.quantity.to_string()));
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                li.currency.clone(),
            ));
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                li.unit_amount_cents.to_string(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                li.display_name.clone(),
            ));
        }
        params.push(("success_url".to_string(), request.success_url.clone()));
        params.push(("cancel_url".to_string(), request.cancel_url.clone()));
        if let Some(email) = &request.customer_email {
            params.push(("customer_email".to_string(), email.clone()));
        }
        params.push((
            "client_reference_id".to_string(),
            request.client_reference_id.clone(),
        ));
        params.push((
            "metadata[order_id]".to_string(),
            request.metadata.order_id.clone(),
        ));
        params.push((
            "metadata[session_key]".to_string(),
            request.metadata.session_key.clone(),
        ));
        params.push((
            "metadata[user_id]".to_string(),
            request.metadata.user_id.clone(),
        ));
        params.push(("metadata[email]".to_string(), request.metadata.email.clone()));
        params
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(line_items = request.line_items.len()))]
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError> {
        let params = Self::form_params(&request);
        let response = self
            .client
            .post(format!("{}{}", self.api_base, SESSIONS_PATH))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) if !body.error.message.is_empty() => body.error.message,
                _ => format!("checkout session request failed with status {status}"),
            };
            return Err(GatewayError::Rejected(message));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid session response: {e}")))?;
        debug!(session_id = %session.id, "gateway session created");
        Ok(GatewaySession {
            id: session.id,
            url: session.url,
        })
    }
}
