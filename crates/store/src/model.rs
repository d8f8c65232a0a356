//! Rows held by the catalog and order stores.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product. Read-only from the ordering flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
}

/// Fields of a product that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }
}

/// An order header. Its items live in their own table and its total is
/// always derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A (order, product, quantity) association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
}
