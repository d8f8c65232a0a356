//! In-memory gateway for tests and keyless local runs.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{PaymentError, Result};
use crate::gateway::{CheckoutRequest, CheckoutSession, PaymentGateway};

#[derive(Debug)]
struct InMemoryGatewayState {
    requests: Vec<CheckoutRequest>,
    next_id: u32,
    configured: bool,
    fail_on_checkout: bool,
}

impl Default for InMemoryGatewayState {
    fn default() -> Self {
        Self {
            requests: Vec::new(),
            next_id: 0,
            configured: true,
            fail_on_checkout: false,
        }
    }
}

/// In-memory payment gateway.
///
/// Records every checkout request and hands out fake hosted-checkout
/// URLs. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Host used in the generated checkout URLs.
    pub const CHECKOUT_HOST: &'static str = "https://checkout.example.test";

    /// Creates a configured in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that reports itself as unconfigured.
    pub fn unconfigured() -> Self {
        let gateway = Self::default();
        gateway.set_configured(false);
        gateway
    }

    pub fn set_configured(&self, configured: bool) {
        self.state.write().unwrap().configured = configured;
    }

    /// Configures the gateway to fail on checkout calls.
    pub fn set_fail_on_checkout(&self, fail: bool) {
        self.state.write().unwrap().fail_on_checkout = fail;
    }

    /// Returns the checkout requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.state.read().unwrap().requests.clone()
    }

    /// Returns the most recent checkout request.
    pub fn last_request(&self) -> Option<CheckoutRequest> {
        self.state.read().unwrap().requests.last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    fn is_configured(&self) -> bool {
        self.state.read().unwrap().configured
    }

    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let mut state = self.state.write().unwrap();

        if !state.configured {
            return Err(PaymentError::NotConfigured);
        }
        if state.fail_on_checkout {
            return Err(PaymentError::Declined("Checkout refused".to_string()));
        }

        state.next_id += 1;
        let id = format!("cs_test_{:04}", state.next_id);
        let url = format!("{}/{id}", Self::CHECKOUT_HOST);
        state.requests.push(request);

        Ok(CheckoutSession { id, url })
    }
}
