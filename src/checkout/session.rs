use super::allocation::allocate_discount;
use super::snapshot::{build_snapshot, LineSnapshot};
use super::split::split_line;
use crate::entities::order;
use crate::errors::ServiceError;
use crate::gateway::{
    CreateSessionRequest, GatewayLineItem, PaymentGateway, SessionMetadata,
};
use crate::money::{sum_cents, to_cents};
use crate::services::orders::OrderService;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Request-scoped context for a session build: who is asking, under which
/// session key.
#[derive(Debug, Clone, Default)]
pub struct CheckoutContext {
    pub session_key: String,
    pub user_id: Option<i64>,
}

/// Result of a successful session build.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub order_id: i64,
    pub url: String,
}

/// Orchestrates the settlement build: snapshot, discount allocation, unit
/// split, drift reconciliation, and the external session-creation call.
///
/// The gateway client is injected; the service holds no global state and each
/// call is an independent unit of work over a point-in-time read of the
/// order. Two concurrent builds for the same unpaid order may both succeed;
/// the confirmation step is what is idempotent.
#[derive(Clone)]
pub struct CheckoutService {
    orders: OrderService,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
    frontend_base_url: String,
}

impl CheckoutService {
    pub fn new(
        orders: OrderService,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
        frontend_base_url: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            gateway,
            currency: currency.into(),
            frontend_base_url: frontend_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds and creates a gateway checkout session for an unpaid order.
    #[instrument(skip(self, ctx))]
    pub async fn create_session(
        &self,
        order_id: i64,
        ctx: &CheckoutContext,
    ) -> Result<SessionOutcome, ServiceError> {
        let (order, items) = self
            .orders
            .find_unpaid_with_items(order_id)
            .await?
            .ok_or(ServiceError::PreconditionFailed)?;

        let lines = build_snapshot(&items);
        if lines.is_empty() {
            return Err(ServiceError::EmptyOrder);
        }

        let backend_subtotal_cents = sum_cents(lines.iter().map(|l| l.line_subtotal_cents));
        let backend_discount_cents =
            to_cents(order.discount).clamp(0, backend_subtotal_cents);
        let stored_total_cents = to_cents(order.total);
        // Fall back to subtotal minus discount when the stored total is
        // absent or zero.
        let backend_total_cents = if stored_total_cents > 0 {
            stored_total_cents
        } else {
            (backend_subtotal_cents - backend_discount_cents).max(0)
        };

        let allocations = allocate_discount(&lines, backend_discount_cents);
        let mut line_items = build_line_items(&lines, &allocations, &self.currency);
        if line_items.is_empty() {
            return Err(ServiceError::NothingToCharge);
        }

        reconcile_total(&mut line_items, backend_total_cents, order.id);

        let request = self.session_request(&order, line_items, ctx);
        let session = self.gateway.create_session(request).await?;

        if let Err(e) = self
            .orders
            .record_gateway_session(order.id, &session.id)
            .await
        {
            warn!(order_id = order.id, error = %e, "failed to record gateway session id");
        }

        info!(
            order_id = order.id,
            subtotal_cents = backend_subtotal_cents,
            discount_cents = backend_discount_cents,
            total_cents = backend_total_cents,
            "checkout session created"
        );
        Ok(SessionOutcome {
            order_id: order.id,
            url: session.url,
        })
    }

    fn session_request(
        &self,
        order: &order::Model,
        line_items: Vec<GatewayLineItem>,
        ctx: &CheckoutContext,
    ) -> CreateSessionRequest {
        let email = if order.email.is_empty() {
            None
        } else {
            Some(order.email.clone())
        };
        CreateSessionRequest {
            line_items,
            success_url: format!(
                "{}/order/thank-you?order={}",
                self.frontend_base_url, order.id
            ),
            cancel_url: format!("{}/cart", self.frontend_base_url),
            customer_email: email,
            client_reference_id: order.id.to_string(),
            metadata: SessionMetadata {
                order_id: order.id.to_string(),
                session_key: ctx.session_key.clone(),
                user_id: ctx.user_id.map(|id| id.to_string()).unwrap_or_default(),
                email: order.email.clone(),
            },
        }
    }
}

/// Converts snapshot lines plus their discount allocations into gateway line
/// items. A line's net total is floored at zero; chunks with zero quantity or
/// zero unit price are not emitted.
pub fn build_line_items(
    lines: &[LineSnapshot],
    allocations: &[i64],
    currency: &str,
) -> Vec<GatewayLineItem> {
    let mut out = Vec::new();
    for (line, alloc) in lines.iter().zip(allocations) {
        let net_line_cents = (line.line_subtotal_cents - alloc).max(0);
        let split = split_line(line.quantity, net_line_cents);
        for (quantity, unit) in [(split.q1, split.u1), (split.q2, split.u2)] {
            if quantity > 0 && unit > 0 {
                out.push(GatewayLineItem {
                    quantity,
                    unit_amount_cents: unit,
                    currency: currency.to_string(),
                    display_name: line.name.clone(),
                });
            }
        }
    }
    out
}

/// Final drift-reconciliation pass: makes the gateway sum equal the backend
/// authoritative total exactly.
///
/// Per-line independent rounding can leave the computed sum a few cents off.
/// Walking the items backwards, the drift is absorbed by the first item whose
/// quantity divides it evenly and whose adjusted unit price stays positive;
/// failing that, one unit is peeled off a multi-unit item into its own chunk
/// carrying the whole correction. Only when neither works (the drift would
/// push every candidate non-positive) is the mismatch left standing, logged
/// at error level for audit: session creation still proceeds, favouring
/// availability, because the residual is bounded by the line count.
pub fn reconcile_total(
    line_items: &mut Vec<GatewayLineItem>,
    backend_total_cents: i64,
    order_id: i64,
) {
    let computed: i64 = line_items
        .iter()
        .map(|li| li.quantity * li.unit_amount_cents)
        .sum();
    if computed == backend_total_cents {
        return;
    }
    let drift = backend_total_cents - computed;

    for li in line_items.iter_mut().rev() {
        if drift % li.quantity == 0 {
            let adjusted = li.unit_amount_cents + drift / li.quantity;
            if adjusted > 0 {
                li.unit_amount_cents = adjusted;
                return;
            }
        }
    }

    for idx in (0..line_items.len()).rev() {
        let li = &line_items[idx];
        if li.quantity > 1 && li.unit_amount_cents + drift > 0 {
            let carried = GatewayLineItem {
                quantity: 1,
                unit_amount_cents: li.unit_amount_cents + drift,
                currency: li.currency.clone(),
                display_name: li.display_name.clone(),
            };
            line_items[idx].quantity -= 1;
            line_items.push(carried);
            return;
        }
    }

    error!(
        order_id,
        backend_total_cents,
        computed_total_cents = computed,
        drift,
        line_count = line_items.len(),
        "checkout total drift could not be reconciled"
    );
}
