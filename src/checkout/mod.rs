//! The checkout settlement core.
//!
//! Takes a persisted order, recomputes its totals from scratch, spreads the
//! backend discount across line items with cent-level precision, and turns
//! the result into a gateway-compatible line-item list whose sum exactly
//! equals the authoritative order total.

pub mod allocation;
pub mod session;
pub mod snapshot;
pub mod split;

pub use session::{CheckoutContext, CheckoutService, SessionOutcome};
pub use snapshot::LineSnapshot;
