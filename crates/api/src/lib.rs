//! HTTP API server with observability for the order service.
//!
//! Provides REST endpoints for idempotent order creation and lookup,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use messaging::{LoggingEventPublisher, ObservedEventPublisher};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{
    InMemoryIdempotencyStore, InMemoryOrderStore, ObservedIdempotencyStore, ObservedOrderStore,
    PostgresIdempotencyStore, PostgresOrderStore,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/healthz", get(routes::health::live))
        .route("/readyz", get(routes::health::ready))
        .route(
            "/v1/orders",
            post(routes::orders::create).get(routes::orders::list),
        )
        .route("/v1/orders/{id}", get(routes::orders::get))
        .route("/v1/orders/{id}/cancel", post(routes::orders::cancel))
        .route_layer(axum::middleware::from_fn(
            middleware::track_http_metrics,
        ))
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

/// Application state backed by in-memory stores and the logging publisher.
pub fn in_memory_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(ObservedOrderStore::new(InMemoryOrderStore::new(), "memory")),
        Arc::new(ObservedEventPublisher::new(LoggingEventPublisher::new())),
        Arc::new(ObservedIdempotencyStore::new(
            InMemoryIdempotencyStore::new(),
            "memory",
        )),
        None,
    ))
}

/// Application state backed by PostgreSQL and the logging publisher.
pub fn postgres_state(pool: PgPool) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(ObservedOrderStore::new(
            PostgresOrderStore::new(pool.clone()),
            "postgres",
        )),
        Arc::new(ObservedEventPublisher::new(LoggingEventPublisher::new())),
        Arc::new(ObservedIdempotencyStore::new(
            PostgresIdempotencyStore::new(pool.clone()),
            "postgres",
        )),
        Some(pool),
    ))
}
