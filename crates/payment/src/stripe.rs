//! Stripe Checkout adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{PaymentError, Result};
use crate::gateway::{CheckoutRequest, CheckoutSession, PaymentGateway};

/// Default Stripe API host.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Deserialize)]
struct StripeProduct {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Payment gateway backed by Stripe's hosted Checkout.
///
/// Each checkout creates a throwaway Stripe product named after the order
/// and a single line item priced at the order total, so the hosted page
/// shows one "Order N" line rather than the individual cart items.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("configured", &self.is_configured())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl StripeGateway {
    /// Creates a gateway for the given secret key and API base URL.
    ///
    /// An empty secret key yields an unconfigured gateway.
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{path}", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            tracing::warn!(%status, path, %message, "stripe rejected request");
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

fn checkout_form(request: &CheckoutRequest, stripe_product_id: &str) -> Vec<(String, String)> {
    vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.amount_minor.to_string(),
        ),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][product]".to_string(),
            stripe_product_id.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        (
            "client_reference_id".to_string(),
            request.order_id.to_string(),
        ),
    ]
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn is_configured(&self) -> bool {
        !self.secret_key.trim().is_empty()
    }

    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, amount = request.amount_minor))]
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        if !self.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let product: StripeProduct = self
            .post_form(
                "/v1/products",
                &[("name".to_string(), request.product_name.clone())],
            )
            .await?;

        let session: StripeCheckoutSession = self
            .post_form("/v1/checkout/sessions", &checkout_form(&request, &product.id))
            .await?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::MissingRedirect(session.id.clone()))?;
        tracing::info!(session_id = %session.id, "stripe checkout session created");

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}
