//! Payment gateway adapters.
//!
//! The storefront never talks to a payment provider beyond a single
//! request: "open a hosted checkout for this amount and give me the URL
//! to send the customer to". The provider later redirects the customer
//! back to one of two return URLs chosen by the caller.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod stripe;

pub use error::{PaymentError, Result};
pub use gateway::{CheckoutRequest, CheckoutSession, PaymentGateway};
pub use memory::InMemoryPaymentGateway;
pub use stripe::StripeGateway;
