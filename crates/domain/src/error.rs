//! Domain error types.

use common::OrderId;
use thiserror::Error;

use crate::order::{Order, OrderStatus, ValidationError};

/// Errors reported by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order with this identifier already exists.
    #[error("Order already exists: {0}")]
    Conflict(OrderId),

    /// A conditional status update found the order in another status.
    #[error("Order {id} is {actual}, not the expected status")]
    StatusChanged { id: OrderId, actual: OrderStatus },

    /// The backing technology failed.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a backend failure.
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Backend(err.into())
    }
}

/// Event delivery failures reported by publishers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The bus could not accept the event.
    #[error("Event bus unavailable: {0}")]
    Unavailable(String),

    /// The event could not be encoded for the wire.
    #[error("Event encoding failed: {0}")]
    Encoding(String),
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input; no side effect happened.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Identifier collision on create.
    #[error("Order already exists: {0}")]
    Conflict(OrderId),

    /// The requested status change is not allowed from the current status.
    #[error("Invalid state transition: cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// The write succeeded but the lifecycle event was not delivered.
    ///
    /// Carries the persisted order; the write is never rolled back.
    #[error("Order saved but failed to publish event: {source}")]
    PublishFailed {
        order: Box<Order>,
        #[source]
        source: PublishError,
    },

    /// A store failed for a reason other than not-found or conflict.
    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns the persisted order carried by a partial failure.
    pub fn persisted_order(&self) -> Option<&Order> {
        match self {
            DomainError::PublishFailed { order, .. } => Some(order),
            _ => None,
        }
    }

    /// Returns true for errors the caller can correct by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::Validation(_)
                | DomainError::NotFound(_)
                | DomainError::IllegalTransition { .. }
        )
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DomainError::NotFound(id),
            StoreError::Conflict(id) => DomainError::Conflict(id),
            other => DomainError::Store(other),
        }
    }
}
