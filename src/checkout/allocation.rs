use super::snapshot::LineSnapshot;

/// Distributes a total discount across lines proportionally to each line's
/// share of the subtotal. Returns one allocation per line, same order and
/// length as `lines`.
///
/// Each raw share is rounded half-up in exact integer arithmetic (no binary
/// fractions), then the last line absorbs the signed rounding drift so the
/// allocations sum to `total_discount_cents` exactly, clamped so no
/// allocation goes negative. Concentrating the correction on the last line
/// is a deliberate, documented tie-break, not an approximation.
///
/// Deterministic: identical inputs always produce identical output.
pub fn allocate_discount(lines: &[LineSnapshot], total_discount_cents: i64) -> Vec<i64> {
    if lines.is_empty() || total_discount_cents <= 0 {
        return vec![0; lines.len()];
    }

    let subtotal: i64 = lines.iter().map(|l| l.line_subtotal_cents).sum();
    if subtotal <= 0 {
        return vec![0; lines.len()];
    }

    let mut allocations = Vec::with_capacity(lines.len());
    let mut running = 0i64;
    for line in lines {
        // round_half_up(line * discount / subtotal), widened so the product
        // cannot overflow.
        let numerator = i128::from(line.line_subtotal_cents) * i128::from(total_discount_cents);
        let denominator = i128::from(subtotal);
        let share = ((2 * numerator + denominator) / (2 * denominator)) as i64;
        allocations.push(share);
        running += share;
    }

    let drift = running - total_discount_cents;
    if drift != 0 {
        if let Some(last) = allocations.last_mut() {
            *last = (*last - drift).max(0);
        }
    }

    allocations
}
