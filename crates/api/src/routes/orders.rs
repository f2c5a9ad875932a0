//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::{IdempotencyKey, MAX_IDEMPOTENCY_KEY_LEN, OrderId};
use domain::{
    CreateOrder, EventPublisher, GuardOutcome, IdempotencyStore, ListFilter, Order, OrderService,
    OrderStatus, OrderStore, StoredResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::ApiError;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub const REPLAYED_HEADER: &str = "idempotent-replayed";

const PUBLISH_WARNING: &str = "199 - \"order accepted but order.created was not published\"";

pub type SharedOrderStore = Arc<dyn OrderStore>;
pub type SharedIdempotencyStore = Arc<dyn IdempotencyStore>;
pub type SharedEventPublisher = Arc<dyn EventPublisher>;
pub type AppOrderService =
    OrderService<SharedOrderStore, SharedEventPublisher, SharedIdempotencyStore>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub service: AppOrderService,
    /// Set when orders live in PostgreSQL; drives the readiness probe.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        orders: SharedOrderStore,
        publisher: SharedEventPublisher,
        idempotency: SharedIdempotencyStore,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            service: OrderService::new(orders, publisher, idempotency),
            pool,
        }
    }
}

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ListOrdersParams {
    /// Builds a filter. Unparseable or non-positive paging values mean "default".
    fn into_filter(self) -> Result<ListFilter, ApiError> {
        let mut filter = ListFilter::new();

        if let Some(status) = self.status.filter(|s| !s.trim().is_empty()) {
            let status: OrderStatus = status
                .trim()
                .parse()
                .map_err(|e| ApiError::Domain(domain::DomainError::Validation(e)))?;
            filter = filter.status(status);
        }
        if let Some(page) = self.page.and_then(|p| p.trim().parse::<u32>().ok()) {
            filter = filter.page(page);
        }
        if let Some(size) = self.page_size.and_then(|p| p.trim().parse::<u32>().ok()) {
            filter = filter.page_size(size);
        }

        Ok(filter)
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderEnvelope {
    pub order: Order,
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

// -- Handlers --

/// POST /v1/orders: create an order at most once per `Idempotency-Key`.
///
/// A retry is answered from the stored response before the body is decoded.
/// The write sequence runs on its own task so a client disconnect cannot cut
/// it short between persisting the order and recording the response.
#[tracing::instrument(skip(state, headers, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let key = idempotency_key(&headers)?;

    if let Some(outcome) = state.service.replay(&key).await? {
        return outcome_response(outcome);
    }

    let cmd: CreateOrder = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON payload: {e}")))?;

    let task_state = Arc::clone(&state);
    let outcome = tokio::spawn(async move { task_state.service.create_order(&key, cmd).await })
        .await
        .map_err(|e| ApiError::Internal(format!("order creation task failed: {e}")))??;

    outcome_response(outcome)
}

/// GET /v1/orders: list orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let filter = params.into_filter()?;
    let orders = state.service.list_orders(&filter).await?;
    Ok(Json(OrderListResponse { orders }))
}

/// GET /v1/orders/{id}: load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let order = state.service.get_order(&OrderId::new(id)).await?;
    Ok(Json(OrderEnvelope { order }))
}

/// POST /v1/orders/{id}/cancel: cancel a pending order.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let order = state.service.cancel_order(&OrderId::new(id)).await?;
    Ok(Json(OrderEnvelope { order }))
}

// -- Helpers --

fn idempotency_key(headers: &HeaderMap) -> Result<IdempotencyKey, ApiError> {
    let raw = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    IdempotencyKey::parse(raw).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Idempotency-Key header required (1 to {MAX_IDEMPOTENCY_KEY_LEN} bytes)"
        ))
    })
}

/// Renders a guard outcome. The stored bytes go out untouched.
///
/// A stored status code outside the HTTP range is a corrupt record and
/// yields a 500 rather than a rewritten status.
fn outcome_response(outcome: GuardOutcome) -> Result<Response, ApiError> {
    let GuardOutcome {
        response,
        replayed,
        publish_error,
    } = outcome;
    let StoredResponse {
        status_code,
        body,
        order_id,
    } = response;

    let status = StatusCode::from_u16(status_code).map_err(|_| {
        tracing::error!(%order_id, status_code, "stored response has an invalid status code");
        ApiError::Internal(format!("stored response has invalid status code {status_code}"))
    })?;
    let mut res = (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response();

    if replayed {
        res.headers_mut().insert(
            HeaderName::from_static(REPLAYED_HEADER),
            HeaderValue::from_static("true"),
        );
    }
    if let Some(err) = publish_error {
        tracing::warn!(error = %err, "order accepted without order.created event");
        res.headers_mut()
            .insert(header::WARNING, HeaderValue::from_static(PUBLISH_WARNING));
    }

    Ok(res)
}
