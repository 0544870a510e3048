//! Fixed-point cent conversion and safe summation.
//!
//! All settlement arithmetic happens in integer cents. Decimal amounts only
//! exist at the persistence and HTTP boundaries; they are converted once on
//! the way in and never mixed with the integer math downstream.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Converts a decimal currency amount to integer cents, rounding half-up
/// (midpoint away from zero).
pub fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Parses a decimal string (the boundary encoding for money values) into
/// cents. Malformed or non-numeric input yields 0 cents.
///
/// This is a defensive default, not a validation boundary: callers that need
/// to reject bad input must check it before reaching for this.
pub fn parse_cents(raw: &str) -> i64 {
    Decimal::from_str(raw.trim()).map(to_cents).unwrap_or(0)
}

/// Sums a sequence of cent values, treating absent entries as zero.
pub fn sum_cents<I>(values: I) -> i64
where
    I: IntoIterator,
    I::Item: Into<Option<i64>>,
{
    values
        .into_iter()
        .map(|v| v.into().unwrap_or(0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn to_cents_rounds_half_up() {
        assert_eq!(to_cents(dec!(3.33)), 333);
        assert_eq!(to_cents(dec!(0.005)), 1);
        assert_eq!(to_cents(dec!(0.004)), 0);
        assert_eq!(to_cents(dec!(9.999)), 1000);
        assert_eq!(to_cents(dec!(0)), 0);
    }

    #[test]
    fn to_cents_handles_negative_amounts() {
        assert_eq!(to_cents(dec!(-1.25)), -125);
        assert_eq!(to_cents(dec!(-0.005)), -1);
    }

    #[test]
    fn parse_cents_accepts_decimal_strings() {
        assert_eq!(parse_cents("12.50"), 1250);
        assert_eq!(parse_cents(" 7 "), 700);
    }

    #[test]
    fn parse_cents_defaults_malformed_input_to_zero() {
        assert_eq!(parse_cents(""), 0);
        assert_eq!(parse_cents("abc"), 0);
        assert_eq!(parse_cents("12.3.4"), 0);
    }

    #[test]
    fn sum_cents_treats_absent_entries_as_zero() {
        assert_eq!(sum_cents([Some(100), None, Some(23)]), 123);
        assert_eq!(sum_cents([1i64, 2, 3]), 6);
        assert_eq!(sum_cents(Vec::<i64>::new()), 0);
    }
}
