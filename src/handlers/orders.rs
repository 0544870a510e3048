use crate::entities::{order, order_item};
use crate::errors::ServiceError;
use crate::handlers::checkout::SESSION_KEY_HEADER;
use crate::handlers::AppState;
use axum::{
    extract::{Json, State},
    http::HeaderMap,
};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// Shipping details resolved from the order by an explicit mapping step.
/// Absent fields are a typed state, not a caught failure; empty strings on
/// the order count as absent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShippingInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
    /// Single display line joined from the present parts.
    pub display: Option<String>,
}

impl ShippingInfo {
    /// Resolves shipping fields, falling back to the order's own contact
    /// fields. Returns `None` when nothing at all is present.
    pub fn from_order(order: &order::Model) -> Option<Self> {
        let first_name = non_empty(&order.first_name);
        let last_name = non_empty(&order.last_name);
        let address1 = non_empty(&order.address);
        let postal_code = non_empty(&order.postal_code);
        let city = non_empty(&order.city);
        let email = non_empty(&order.email);

        if [&first_name, &last_name, &address1, &postal_code, &city, &email]
            .iter()
            .all(|f| f.is_none())
        {
            return None;
        }

        let name_line = match (&first_name, &last_name) {
            (None, None) => None,
            (f, l) => Some(
                format!(
                    "{} {}",
                    f.as_deref().unwrap_or(""),
                    l.as_deref().unwrap_or("")
                )
                .trim()
                .to_string(),
            ),
        };
        let city_line = match (&city, &postal_code) {
            (None, None) => None,
            (c, p) => Some(
                format!(
                    "{} {}",
                    c.as_deref().unwrap_or(""),
                    p.as_deref().unwrap_or("")
                )
                .trim()
                .to_string(),
            ),
        };
        let parts: Vec<String> = [name_line, address1.clone(), city_line]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect();
        let display = if parts.is_empty() {
            None
        } else {
            Some(parts.join(" \u{b7} "))
        };

        Some(Self {
            first_name,
            last_name,
            address1,
            postal_code,
            city,
            email,
            display,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDetail {
    pub product_id: i64,
    pub name: String,
    /// Unit price as a decimal string
    #[schema(example = "3.33")]
    pub price: String,
    pub quantity: i64,
    /// Line total as a decimal string
    #[schema(example = "9.99")]
    pub line_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub id: i64,
    pub paid: bool,
    /// Subtotal as a decimal string
    pub subtotal: String,
    /// Discount as a decimal string
    pub discount: String,
    /// Total as a decimal string
    pub total: String,
    pub items: Vec<OrderItemDetail>,
    pub shipping: Option<ShippingInfo>,
    pub created: String,
}

/// Caller's most recent order
///
/// Convenience lookup for the thank-you flow, keyed by the caller's opaque
/// session header. Money values are decimal strings, never binary floats.
#[utoipa::path(
    get,
    path = "/orders/last",
    responses(
        (status = 200, description = "Most recent order", body = OrderDetail),
        (status = 404, description = "No recent order", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn last_order(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<OrderDetail>, ServiceError> {
    let session_key = headers
        .get(SESSION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let order_id = state
        .last_orders
        .recall(session_key)
        .ok_or_else(|| ServiceError::NotFound("No recent order".to_string()))?;

    let (order, items) = state
        .order_service()
        .find_with_items(order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

    Ok(Json(order_detail(&order, &items)))
}

fn order_detail(order: &order::Model, items: &[order_item::Model]) -> OrderDetail {
    let mut subtotal = Decimal::ZERO;
    let mut out_items = Vec::with_capacity(items.len());
    for item in items {
        let price = item.price.unwrap_or(Decimal::ZERO);
        let quantity = i64::from(item.quantity.unwrap_or(0));
        let line_total = price * Decimal::from(quantity);
        subtotal += line_total;
        out_items.push(OrderItemDetail {
            product_id: item.product_id,
            name: item.product_name.clone(),
            price: price.to_string(),
            quantity,
            line_total: line_total.to_string(),
        });
    }

    let total = if order.total > Decimal::ZERO {
        order.total
    } else {
        (subtotal - order.discount).max(Decimal::ZERO)
    };

    OrderDetail {
        id: order.id,
        paid: order.paid,
        subtotal: subtotal.to_string(),
        discount: order.discount.to_string(),
        total: total.to_string(),
        items: out_items,
        shipping: ShippingInfo::from_order(order),
        created: order.created_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sample_order() -> order::Model {
        order::Model {
            id: 7,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            address: "12 Analytical Way".into(),
            postal_code: "10115".into(),
            city: "Berlin".into(),
            paid: false,
            discount: dec!(1.00),
            total: Decimal::ZERO,
            coupon_id: None,
            stripe_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn shipping_resolves_named_fields_and_display_line() {
        let info = ShippingInfo::from_order(&sample_order()).unwrap();
        assert_eq!(info.first_name.as_deref(), Some("Ada"));
        assert_eq!(info.address1.as_deref(), Some("12 Analytical Way"));
        assert_eq!(
            info.display.as_deref(),
            Some("Ada Lovelace \u{b7} 12 Analytical Way \u{b7} Berlin 10115")
        );
    }

    #[test]
    fn shipping_is_none_when_every_field_is_blank() {
        let mut order = sample_order();
        order.first_name.clear();
        order.last_name.clear();
        order.email.clear();
        order.address.clear();
        order.postal_code.clear();
        order.city = "  ".into();
        assert!(ShippingInfo::from_order(&order).is_none());
    }

    #[test]
    fn order_detail_falls_back_to_computed_total() {
        let order = sample_order();
        let items = vec![order_item::Model {
            id: 1,
            order_id: 7,
            product_id: 11,
            product_name: "Candle A".into(),
            price: Some(dec!(3.33)),
            quantity: Some(3),
        }];
        let detail = order_detail(&order, &items);
        assert_eq!(detail.subtotal, "9.99");
        assert_eq!(detail.discount, "1.00");
        assert_eq!(detail.total, "8.99");
        assert_eq!(detail.items[0].line_total, "9.99");
    }
}
