//! Payment error types.

use thiserror::Error;

/// Errors that can occur while talking to a payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway has no credentials configured.
    #[error("Payment gateway is not configured")]
    NotConfigured,

    /// The request never produced a usable HTTP response.
    #[error("Payment gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("Payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The gateway answered successfully but without a checkout URL.
    #[error("Payment gateway returned checkout session {0} without a URL")]
    MissingRedirect(String),

    /// The payment was declined by the gateway.
    #[error("Payment declined: {0}")]
    Declined(String),
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
