//! Order details endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::OrderDetails;
use payment::PaymentGateway;
use serde::Serialize;
use store::Store;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub status: String,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
    pub total: String,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let items = details
            .lines
            .into_iter()
            .map(|line| OrderItemResponse {
                id: line.item.id.as_i64(),
                product_id: line.product.id.as_i64(),
                product_name: line.product.name,
                quantity: line.item.quantity,
                unit_price_cents: line.product.price.cents(),
                line_total_cents: line.line_total.cents(),
            })
            .collect();

        Self {
            id: details.order.id.as_i64(),
            status: details.order.status.to_string(),
            created_at: details.order.created_at.to_rfc3339(),
            items,
            total: details.total.to_decimal_string(),
            total_cents: details.total.cents(),
        }
    }
}

/// GET /order_details/{order_id}/: an order with its items and total.
#[tracing::instrument(skip(state))]
pub async fn details<S: Store + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let details = state.ordering.get_order(OrderId::new(order_id)).await?;
    Ok(Json(OrderResponse::from(details)))
}
