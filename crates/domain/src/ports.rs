//! Capability traits the pipeline and guard depend on.
//!
//! Implementations live in the `order-store` and `messaging` crates. All
//! implementations must be thread-safe (Send + Sync).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{IdempotencyKey, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::{PublishError, StoreError};
use crate::order::{ListFilter, Order, OrderStatus};

/// Persistence contract for orders.
///
/// The store does not enforce the status state machine; callers decide which
/// transitions are legal and the store only guarantees that a status change
/// applies to the status the caller checked.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    ///
    /// Fails with [`StoreError::Conflict`] if the identifier already exists.
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    /// Fetches an order, or fails with [`StoreError::NotFound`].
    async fn get_by_id(&self, id: &OrderId) -> Result<Order, StoreError>;

    /// Lists orders matching the filter, most recently created first.
    ///
    /// A page beyond the data yields an empty vector.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Order>, StoreError>;

    /// Moves the order from `expected` to `status`, refreshes `updated_at` and
    /// returns the updated order.
    ///
    /// The write is a compare-and-set on the current status: if the order is no
    /// longer in `expected` nothing changes and the call fails with
    /// [`StoreError::StatusChanged`]. Fails with [`StoreError::NotFound`] if the
    /// id is absent.
    async fn update_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, StoreError>;
}

/// The exact response to replay for a reused idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub order_id: OrderId,
}

/// A dedup ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub response: StoredResponse,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(key: IdempotencyKey, response: StoredResponse) -> Self {
        Self {
            key,
            response,
            created_at: Utc::now(),
        }
    }
}

/// Persistence contract mapping idempotency keys to produced responses.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Returns the stored response, or `None` when the key is unseen.
    async fn get(&self, key: &IdempotencyKey) -> Result<Option<StoredResponse>, StoreError>;

    /// Stores the response under the key, first writer wins.
    ///
    /// Returns `true` if this call's response was retained and `false` if an
    /// earlier writer already owned the key. A lost race is not an error and
    /// never overwrites the stored response.
    async fn save(&self, key: &IdempotencyKey, response: &StoredResponse) -> Result<bool, StoreError>;
}

/// Contract for emitting lifecycle events to an external bus.
///
/// Retry and backoff are the publisher's concern.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_order_created(&self, order_id: &OrderId) -> Result<(), PublishError>;

    async fn publish_order_processed(&self, order_id: &OrderId) -> Result<(), PublishError>;

    async fn publish_order_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), PublishError>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        (**self).create(order).await
    }

    async fn get_by_id(&self, id: &OrderId) -> Result<Order, StoreError> {
        (**self).get_by_id(id).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Order>, StoreError> {
        (**self).list(filter).await
    }

    async fn update_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        (**self).update_status(id, expected, status).await
    }
}

#[async_trait]
impl<T: IdempotencyStore + ?Sized> IdempotencyStore for Arc<T> {
    async fn get(&self, key: &IdempotencyKey) -> Result<Option<StoredResponse>, StoreError> {
        (**self).get(key).await
    }

    async fn save(&self, key: &IdempotencyKey, response: &StoredResponse) -> Result<bool, StoreError> {
        (**self).save(key, response).await
    }
}

#[async_trait]
impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    async fn publish_order_created(&self, order_id: &OrderId) -> Result<(), PublishError> {
        (**self).publish_order_created(order_id).await
    }

    async fn publish_order_processed(&self, order_id: &OrderId) -> Result<(), PublishError> {
        (**self).publish_order_processed(order_id).await
    }

    async fn publish_order_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), PublishError> {
        (**self).publish_order_failed(order_id, reason).await
    }
}
