//! Metric and tracing decorators for store implementations.

use std::time::Instant;

use async_trait::async_trait;
use common::{IdempotencyKey, OrderId};

use domain::{
    IdempotencyStore, ListFilter, Order, OrderStatus, OrderStore, StoreError, StoredResponse,
};

fn record<T>(store: &'static str, operation: &'static str, start: Instant, result: &Result<T, StoreError>) {
    let status = match result {
        Ok(_) => "success",
        Err(StoreError::NotFound(_)) => "not_found",
        Err(StoreError::Conflict(_)) | Err(StoreError::StatusChanged { .. }) => "conflict",
        Err(StoreError::Backend(_)) => "error",
    };

    metrics::histogram!(
        "store_operation_duration_seconds",
        "store" => store,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());

    if let Err(StoreError::Backend(e)) = result {
        tracing::error!(store, operation, error = %e, "store operation failed");
    }
}

/// Wraps an [`OrderStore`] with latency histograms and spans.
#[derive(Clone)]
pub struct ObservedOrderStore<S> {
    inner: S,
    store: &'static str,
}

impl<S> ObservedOrderStore<S> {
    /// Wraps `inner`, labelling its metrics with `store` (e.g. "postgres").
    pub fn new(inner: S, store: &'static str) -> Self {
        Self { inner, store }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: OrderStore> OrderStore for ObservedOrderStore<S> {
    #[tracing::instrument(name = "OrderStore::create", skip_all, fields(order_id = %order.id()))]
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = self.inner.create(order).await;
        record(self.store, "create_order", start, &result);
        result
    }

    #[tracing::instrument(name = "OrderStore::get_by_id", skip(self))]
    async fn get_by_id(&self, id: &OrderId) -> Result<Order, StoreError> {
        let start = Instant::now();
        let result = self.inner.get_by_id(id).await;
        record(self.store, "get_order_by_id", start, &result);
        result
    }

    #[tracing::instrument(name = "OrderStore::list", skip(self))]
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Order>, StoreError> {
        let start = Instant::now();
        let result = self.inner.list(filter).await;
        record(self.store, "list_orders", start, &result);
        if let Ok(orders) = &result {
            tracing::debug!(count = orders.len(), "listed orders");
        }
        result
    }

    #[tracing::instrument(name = "OrderStore::update_status", skip(self))]
    async fn update_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let start = Instant::now();
        let result = self.inner.update_status(id, expected, status).await;
        record(self.store, "update_order_status", start, &result);
        result
    }
}

/// Wraps an [`IdempotencyStore`] with latency histograms and spans.
#[derive(Clone)]
pub struct ObservedIdempotencyStore<S> {
    inner: S,
    store: &'static str,
}

impl<S> ObservedIdempotencyStore<S> {
    pub fn new(inner: S, store: &'static str) -> Self {
        Self { inner, store }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: IdempotencyStore> IdempotencyStore for ObservedIdempotencyStore<S> {
    #[tracing::instrument(name = "IdempotencyStore::get", skip(self))]
    async fn get(&self, key: &IdempotencyKey) -> Result<Option<StoredResponse>, StoreError> {
        let start = Instant::now();
        let result = self.inner.get(key).await;
        record(self.store, "get_idempotency_key", start, &result);
        result
    }

    #[tracing::instrument(name = "IdempotencyStore::save", skip(self, response))]
    async fn save(&self, key: &IdempotencyKey, response: &StoredResponse) -> Result<bool, StoreError> {
        let start = Instant::now();
        let result = self.inner.save(key, response).await;
        record(self.store, "save_idempotency_key", start, &result);
        result
    }
}
