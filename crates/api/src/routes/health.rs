//! Liveness and readiness endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::orders::AppState;

/// Upper bound on the database ping behind `/readyz`.
const READY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /healthz: the process is up.
pub async fn live() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        error: None,
    })
}

/// GET /readyz: the process can serve traffic.
///
/// With PostgreSQL configured this pings the pool; in-memory mode is always
/// ready.
pub async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let Some(pool) = &state.pool else {
        return (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                error: None,
            }),
        );
    };

    let error = match tokio::time::timeout(READY_TIMEOUT, order_store::postgres::ping(pool)).await
    {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(format!("database ping exceeded {READY_TIMEOUT:?}")),
    };

    match error {
        None => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                error: None,
            }),
        ),
        Some(error) => {
            tracing::warn!(%error, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    error: Some(error),
                }),
            )
        }
    }
}
