//! Gateway trait and request/response types.

use async_trait::async_trait;
use common::{Money, OrderId};

use crate::error::Result;

/// Everything a gateway needs to open a hosted checkout for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    /// Amount in the currency's minor unit (cents for USD).
    pub amount_minor: i64,
    /// ISO currency code, e.g. `"USD"`.
    pub currency: String,
    /// Label shown on the hosted checkout page.
    pub product_name: String,
    /// Where the gateway sends the customer after a successful payment.
    pub success_url: String,
    /// Where the gateway sends the customer after abandoning the checkout.
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Builds a single-line USD checkout for an order total.
    pub fn for_order(order_id: OrderId, total: Money, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            order_id,
            amount_minor: total.cents(),
            currency: "USD".to_string(),
            product_name: format!("Order {order_id}"),
            success_url: format!("{base_url}/successful_payment/"),
            cancel_url: format!("{base_url}/cancelled_payment/"),
        }
    }
}

/// A hosted checkout opened by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Gateway-assigned session id.
    pub id: String,
    /// URL the customer must be redirected to.
    pub url: String,
}

/// Trait for hosted-checkout payment providers.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns false when the gateway has no credentials and real checkout
    /// sessions cannot be created.
    fn is_configured(&self) -> bool;

    /// Opens a hosted checkout session.
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession>;
}
