//! Order status state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of an order in its lifecycle.
///
/// ```text
/// Pending ──► Active ──► Completed
/// ```
///
/// A cancelled checkout leaves the order in whatever status it had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Cart is being filled, items can be added/removed.
    #[default]
    Pending,

    /// Payment has been initiated with the gateway.
    Active,

    /// Gateway reported a successful payment (terminal state).
    Completed,
}

/// Returned when a stored status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    /// Statuses an order may move to from this one, including itself.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Pending, OrderStatus::Active],
            OrderStatus::Active => &[OrderStatus::Active, OrderStatus::Completed],
            OrderStatus::Completed => &[OrderStatus::Completed],
        }
    }

    /// Returns true if moving to `next` follows the lifecycle.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Returns the stored representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Active => "active",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "active" => Ok(OrderStatus::Active),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
