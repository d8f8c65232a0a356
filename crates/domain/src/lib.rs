//! Domain layer for the storefront.
//!
//! This crate provides the order lifecycle:
//! - `CartSession`, the caller-owned binding from a browser session to its order
//! - `OrderingService`, which lists the catalog, edits the cart and drives
//!   the pending → active → completed status transitions
//! - read views (`Catalog`, `OrderDetails`) handed back to the HTTP layer

pub mod error;
pub mod order;

pub use error::DomainError;
pub use order::{
    CartSession, Catalog, CatalogEntry, ItemChange, OrderDetails, OrderLine, OrderSummary,
    OrderingService, PaymentRedirect,
};
