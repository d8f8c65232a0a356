//! Checkout endpoints.
//!
//! `/successful_payment/` and `/cancelled_payment/` are plain return URLs
//! handed to the gateway; nothing verifies that a payment really happened.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use payment::PaymentGateway;
use serde::Serialize;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::session::SessionHandle;

#[derive(Serialize)]
pub struct PaymentOutcomeResponse {
    pub order_id: Option<i64>,
    pub outcome: &'static str,
}

/// POST /process_payment/: open a hosted checkout for the caller's order.
#[tracing::instrument(skip(state))]
pub async fn process<S: Store + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    session: SessionHandle,
) -> Result<Response, ApiError> {
    let cart = state.sessions.load(session.id).await;
    let redirect = state.ordering.initiate_payment(&cart).await?;
    let location = redirect.location(state.ordering.base_url());

    Ok(session.attach(Redirect::to(&location).into_response()))
}

/// GET /successful_payment/: gateway success return URL.
#[tracing::instrument(skip(state))]
pub async fn successful<S: Store + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    session: SessionHandle,
) -> Response {
    let mut cart = state.sessions.load(session.id).await;
    let result = state.ordering.complete_payment(&mut cart).await;
    state.sessions.save(session.id, cart).await;

    session.respond(result.map_err(ApiError::from).map(|order_id| {
        let body = PaymentOutcomeResponse {
            order_id: order_id.map(|id| id.as_i64()),
            outcome: "completed",
        };
        Json(body).into_response()
    }))
}

/// GET /cancelled_payment/: gateway cancel return URL.
#[tracing::instrument(skip(state))]
pub async fn cancelled<S: Store + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    session: SessionHandle,
) -> Response {
    let mut cart = state.sessions.load(session.id).await;
    let result = state.ordering.cancel_payment(&mut cart).await;
    state.sessions.save(session.id, cart).await;

    session.respond(result.map_err(ApiError::from).map(|order_id| {
        let body = PaymentOutcomeResponse {
            order_id: order_id.map(|id| id.as_i64()),
            outcome: "cancelled",
        };
        Json(body).into_response()
    }))
}
