use crate::entities::order_item;
use crate::money::to_cents;
use rust_decimal::Decimal;

/// Point-in-time, immutable capture of one priced order line.
///
/// Built fresh on every checkout attempt and discarded at the end of the
/// request, so price changes between cart and checkout are always captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSnapshot {
    pub name: String,
    pub quantity: i64,
    pub unit_cents: i64,
    pub line_subtotal_cents: i64,
}

/// Builds the monetary snapshot for an order's items, in the order they were
/// fetched. Pure read, no side effects.
///
/// Lines with a non-positive quantity or a negative unit price are excluded
/// outright; they contribute nothing downstream. An absent quantity defaults
/// to 1, an absent price to 0.
pub fn build_snapshot(items: &[order_item::Model]) -> Vec<LineSnapshot> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let quantity = i64::from(item.quantity.unwrap_or(1));
        let unit_cents = to_cents(item.price.unwrap_or(Decimal::ZERO));
        if quantity <= 0 || unit_cents < 0 {
            continue;
        }
        out.push(LineSnapshot {
            name: item.product_name.clone(),
            quantity,
            unit_cents,
            line_subtotal_cents: unit_cents * quantity,
        });
    }
    out
}
