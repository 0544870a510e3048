/// A line's net total decomposed into at most two (quantity, unit price)
/// chunks. The gateway only accepts a single integer unit price per line
/// item, so a net total that does not divide evenly is expressed as
/// `quantity - remainder` units at the floored price plus `remainder` units
/// at one cent more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitSplit {
    pub q1: i64,
    pub u1: i64,
    pub q2: i64,
    pub u2: i64,
}

impl UnitSplit {
    /// The all-zero split, meaning "drop this line entirely".
    pub fn dropped() -> Self {
        Self::default()
    }

    pub fn is_dropped(&self) -> bool {
        *self == Self::default()
    }
}

/// Splits a net (post-discount) line total into up to two gateway chunks so
/// that `q1*u1 + q2*u2 == net_line_cents` and `q1 + q2 == quantity` exactly.
///
/// A non-positive quantity or net total returns the dropped split: a line
/// fully consumed by discount disappears from the gateway request rather
/// than being sent with a zero amount.
pub fn split_line(quantity: i64, net_line_cents: i64) -> UnitSplit {
    if quantity <= 0 || net_line_cents <= 0 {
        return UnitSplit::dropped();
    }

    let base = net_line_cents / quantity;
    let remainder = net_line_cents - base * quantity;
    UnitSplit {
        q1: quantity - remainder,
        u1: base,
        q2: remainder,
        u2: if remainder > 0 { base + 1 } else { 0 },
    }
}
