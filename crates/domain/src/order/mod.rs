//! Order lifecycle service and related types.

mod service;
mod session;
mod views;

pub use service::{ItemChange, OrderingService};
pub use session::CartSession;
pub use views::{Catalog, CatalogEntry, OrderDetails, OrderLine, OrderSummary, PaymentRedirect};
