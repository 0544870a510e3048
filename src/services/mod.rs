// Order store collaborator
pub mod orders;

// Session-scoped "last order" convenience store
pub mod last_order;

pub use last_order::{InMemoryLastOrderStore, LastOrderStore};
pub use orders::OrderService;
