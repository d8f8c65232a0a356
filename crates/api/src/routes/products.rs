//! Catalog and cart editing endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use common::ProductId;
use domain::{Catalog, OrderSummary};
use payment::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::session::SessionHandle;

// -- Request types --

/// Largest quantity accepted for one cart line.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    #[serde(default)]
    pub quantity: u32,
}

impl QuantityForm {
    fn validated(&self) -> Result<u32, ApiError> {
        if self.quantity > MAX_QUANTITY {
            return Err(ApiError::BadRequest(format!(
                "quantity must be at most {MAX_QUANTITY}"
            )));
        }
        Ok(self.quantity)
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct CatalogResponse {
    pub products: Vec<ProductResponse>,
    pub order: Option<OrderSummaryResponse>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub price_cents: i64,
    /// Quantity already in the caller's cart.
    pub quantity: Option<u32>,
}

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub id: i64,
    pub status: String,
    pub created_at: String,
    pub item_count: usize,
    pub total: String,
    pub total_cents: i64,
}

impl From<OrderSummary> for OrderSummaryResponse {
    fn from(summary: OrderSummary) -> Self {
        Self {
            id: summary.order.id.as_i64(),
            status: summary.order.status.to_string(),
            created_at: summary.order.created_at.to_rfc3339(),
            item_count: summary.item_count,
            total: summary.total.to_decimal_string(),
            total_cents: summary.total.cents(),
        }
    }
}

impl From<Catalog> for CatalogResponse {
    fn from(catalog: Catalog) -> Self {
        Self {
            products: catalog
                .products
                .into_iter()
                .map(|entry| ProductResponse {
                    id: entry.product.id.as_i64(),
                    name: entry.product.name,
                    description: entry.product.description,
                    price: entry.product.price.to_decimal_string(),
                    price_cents: entry.product.price.cents(),
                    quantity: entry.quantity,
                })
                .collect(),
            order: catalog.order.map(OrderSummaryResponse::from),
        }
    }
}

// -- Handlers --

/// GET /products/: every product, annotated with the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    session: SessionHandle,
) -> Result<Response, ApiError> {
    let cart = state.sessions.load(session.id).await;
    let catalog = state.ordering.list_catalog(&cart).await?;

    Ok(session.attach(Json(CatalogResponse::from(catalog)).into_response()))
}

/// POST /add_or_update_order_item/{product_id}/: set the cart quantity of
/// a product, then send the caller back to the catalog.
#[tracing::instrument(skip(state))]
pub async fn upsert_item<S: Store + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    session: SessionHandle,
    Path(product_id): Path<i64>,
    Form(form): Form<QuantityForm>,
) -> Response {
    let quantity = match form.validated() {
        Ok(quantity) => quantity,
        Err(err) => return session.respond(Err(err)),
    };

    let mut cart = state.sessions.load(session.id).await;
    let result = state
        .ordering
        .upsert_item(&mut cart, ProductId::new(product_id), quantity)
        .await;
    // the binding may have changed even if a later step failed
    state.sessions.save(session.id, cart).await;

    session.respond(result.map_err(ApiError::from).map(|change| {
        tracing::debug!(?change, "cart updated");
        Redirect::to("/products/").into_response()
    }))
}
