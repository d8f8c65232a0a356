//! Session binding.

use common::OrderId;
use serde::{Deserialize, Serialize};

/// The per-caller pointer to the order currently being built or paid.
///
/// The HTTP layer owns one of these per browser session and passes it to
/// every lifecycle operation; the service never keeps session state itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSession {
    order_id: Option<OrderId>,
}

impl CartSession {
    /// Creates a session with no order bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session already bound to `order_id`.
    pub fn bound_to(order_id: OrderId) -> Self {
        Self {
            order_id: Some(order_id),
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn is_bound(&self) -> bool {
        self.order_id.is_some()
    }

    pub fn bind(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
    }

    pub fn clear(&mut self) {
        self.order_id = None;
    }

    /// Clears the binding and returns what it pointed at.
    pub fn take(&mut self) -> Option<OrderId> {
        self.order_id.take()
    }
}
