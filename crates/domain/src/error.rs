//! Domain error types.

use common::{AmountOverflow, OrderId, ProductId};
use payment::PaymentError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during ordering operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The requested order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The session has no order bound to it.
    #[error("No order is bound to this session")]
    NoActiveOrder,

    /// A line or order total would not fit in the money representation.
    #[error("Order total out of range")]
    AmountOverflow(#[from] AmountOverflow),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    /// The payment gateway failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AmountOverflow(overflow) => DomainError::AmountOverflow(overflow),
            other => DomainError::Store(other),
        }
    }
}
