//! Health and metrics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use payment::PaymentGateway;
use serde::Serialize;
use store::Store;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub payments: &'static str,
}

/// GET /health: liveness plus whether real checkouts are enabled.
pub async fn health<S: Store + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Json<HealthResponse> {
    let payments = if state.ordering.gateway().is_configured() {
        "enabled"
    } else {
        "disabled"
    };
    Json(HealthResponse {
        status: "ok",
        payments,
    })
}

/// GET /metrics: Prometheus text exposition.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
