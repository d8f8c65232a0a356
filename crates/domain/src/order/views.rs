//! Read views returned by the ordering service.

use common::{Money, OrderId, OrderStatus};
use store::{Order, OrderItem, Product};

/// A catalog product annotated with the quantity already in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub product: Product,
    /// `None` when the product is not in the bound order (or nothing is bound).
    pub quantity: Option<u32>,
}

/// Short summary of the bound order shown next to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order: Order,
    pub item_count: usize,
    pub total: Money,
}

/// The full catalog as seen by one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub products: Vec<CatalogEntry>,
    pub order: Option<OrderSummary>,
}

/// One item of an order together with its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub item: OrderItem,
    pub product: Product,
    pub line_total: Money,
}

/// An order with its items and derived total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub total: Money,
}

impl OrderDetails {
    pub fn id(&self) -> OrderId {
        self.order.id
    }

    pub fn status(&self) -> OrderStatus {
        self.order.status
    }
}

/// Where the customer goes after asking to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRedirect {
    /// Hosted checkout page opened by the gateway.
    Gateway(String),
    /// The gateway is not configured; show the order instead.
    OrderDetails(OrderId),
}

impl PaymentRedirect {
    /// Resolves the redirect to an absolute URL.
    pub fn location(&self, base_url: &str) -> String {
        match self {
            PaymentRedirect::Gateway(url) => url.clone(),
            PaymentRedirect::OrderDetails(order_id) => {
                format!(
                    "{}/order_details/{order_id}/",
                    base_url.trim_end_matches('/')
                )
            }
        }
    }
}
