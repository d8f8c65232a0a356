//! HTTP storefront.
//!
//! Serves the catalog, cart editing and hosted-checkout endpoints, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;
pub mod session;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::OrderingService;
use metrics_exporter_prometheus::PrometheusHandle;
use payment::PaymentGateway;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use session::SessionRegistry;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store, G: PaymentGateway> {
    pub ordering: OrderingService<S, G>,
    pub sessions: SessionRegistry,
}

/// Creates the application state around a store and a payment gateway.
pub fn create_state<S: Store, G: PaymentGateway>(
    store: S,
    gateway: G,
    base_url: impl Into<String>,
) -> Arc<AppState<S, G>> {
    Arc::new(AppState {
        ordering: OrderingService::new(store, gateway, base_url),
        sessions: SessionRegistry::new(),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static, G: PaymentGateway + 'static>(
    state: Arc<AppState<S, G>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::products::list::<S, G>))
        .route("/products/", get(routes::products::list::<S, G>))
        .route(
            "/add_or_update_order_item/{product_id}/",
            post(routes::products::upsert_item::<S, G>),
        )
        .route(
            "/order_details/{order_id}/",
            get(routes::orders::details::<S, G>),
        )
        .route("/process_payment/", post(routes::payments::process::<S, G>))
        .route(
            "/successful_payment/",
            get(routes::payments::successful::<S, G>),
        )
        .route(
            "/cancelled_payment/",
            get(routes::payments::cancelled::<S, G>),
        )
        .route("/health", get(routes::ops::health::<S, G>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
