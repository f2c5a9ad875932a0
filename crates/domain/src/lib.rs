//! Domain layer for the order service.
//!
//! This crate provides the core domain abstractions including:
//! - Order entity with its status state machine
//! - Capability traits for order persistence, idempotency records and events
//! - Create-order pipeline and the idempotency guard around it
//! - OrderService facade used by the HTTP layer

pub mod command;
pub mod error;
pub mod idempotency;
pub mod order;
pub mod ports;

#[cfg(test)]
mod testing;

pub use command::CreateOrderHandler;
pub use error::{DomainError, PublishError, StoreError};
pub use idempotency::{GuardOutcome, IdempotencyGuard, ORDER_ACCEPTED_STATUS, accepted_response};
pub use order::{
    CreateOrder, ListFilter, Order, OrderEvent, OrderService, OrderStatus, ValidationError,
};
pub use ports::{EventPublisher, IdempotencyRecord, IdempotencyStore, OrderStore, StoredResponse};
