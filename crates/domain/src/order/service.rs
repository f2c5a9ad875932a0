//! Order service providing the application API for order operations.

use common::{IdempotencyKey, OrderId};

use crate::command::CreateOrderHandler;
use crate::error::{DomainError, StoreError};
use crate::idempotency::{GuardOutcome, IdempotencyGuard};
use crate::ports::{EventPublisher, IdempotencyStore, OrderStore};

use super::{CreateOrder, ListFilter, Order, OrderStatus, ValidationError};

/// Service for managing orders.
///
/// Creation goes through the idempotency guard; every other mutation loads
/// the order, checks the transition against the state machine and writes
/// through [`OrderStore::update_status`] conditioned on the status it checked.
/// A concurrent mutation that got there first turns the write into
/// [`DomainError::IllegalTransition`] from the status it left behind.
pub struct OrderService<O, P, I> {
    guard: IdempotencyGuard<O, P, I>,
    orders: O,
    publisher: P,
}

impl<O, P, I> OrderService<O, P, I>
where
    O: OrderStore + Clone,
    P: EventPublisher + Clone,
    I: IdempotencyStore,
{
    /// Creates a new order service over the given ports.
    pub fn new(orders: O, publisher: P, idempotency: I) -> Self {
        let handler = CreateOrderHandler::new(orders.clone(), publisher.clone());
        Self {
            guard: IdempotencyGuard::new(handler, idempotency),
            orders,
            publisher,
        }
    }

    /// Returns a reference to the idempotency guard.
    pub fn guard(&self) -> &IdempotencyGuard<O, P, I> {
        &self.guard
    }

    /// Returns a reference to the order store.
    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Creates an order at most once per idempotency key.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn create_order(
        &self,
        key: &IdempotencyKey,
        cmd: CreateOrder,
    ) -> Result<GuardOutcome, DomainError> {
        self.guard.execute(key, cmd).await
    }

    /// Returns the stored outcome if the key has already been used.
    pub async fn replay(&self, key: &IdempotencyKey) -> Result<Option<GuardOutcome>, DomainError> {
        self.guard.replay(key).await
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, DomainError> {
        if id.is_blank() {
            return Err(ValidationError::OrderIdRequired.into());
        }
        Ok(self.orders.get_by_id(id).await?)
    }

    /// Lists orders, most recent first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, filter: &ListFilter) -> Result<Vec<Order>, DomainError> {
        Ok(self.orders.list(filter).await?)
    }

    /// Cancels a pending order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order, DomainError> {
        self.transition(id, OrderStatus::Canceled).await
    }

    /// Marks a pending order as picked up by processing.
    #[tracing::instrument(skip(self))]
    pub async fn start_processing(&self, id: &OrderId) -> Result<Order, DomainError> {
        self.transition(id, OrderStatus::Processing).await
    }

    /// Completes a processing order and publishes `order.processed`.
    ///
    /// A publish failure is reported as [`DomainError::PublishFailed`]
    /// carrying the already completed order.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(&self, id: &OrderId) -> Result<Order, DomainError> {
        let order = self.transition(id, OrderStatus::Completed).await?;
        match self.publisher.publish_order_processed(order.id()).await {
            Ok(()) => Ok(order),
            Err(source) => Err(DomainError::PublishFailed {
                order: Box::new(order),
                source,
            }),
        }
    }

    /// Fails a processing order and publishes `order.failed`.
    #[tracing::instrument(skip(self))]
    pub async fn fail_order(&self, id: &OrderId, reason: &str) -> Result<Order, DomainError> {
        let order = self.transition(id, OrderStatus::Failed).await?;
        match self.publisher.publish_order_failed(order.id(), reason).await {
            Ok(()) => Ok(order),
            Err(source) => Err(DomainError::PublishFailed {
                order: Box::new(order),
                source,
            }),
        }
    }

    async fn transition(&self, id: &OrderId, next: OrderStatus) -> Result<Order, DomainError> {
        let order = self.get_order(id).await?;

        if !order.status().can_transition_to(next) {
            tracing::info!(order_id = %id, from = %order.status(), to = %next, "transition rejected");
            return Err(DomainError::IllegalTransition {
                from: order.status(),
                to: next,
            });
        }

        let updated = self
            .orders
            .update_status(id, order.status(), next)
            .await
            .map_err(|e| match e {
                StoreError::StatusChanged { actual, .. } => {
                    tracing::info!(order_id = %id, from = %actual, to = %next, "transition lost to a concurrent update");
                    DomainError::IllegalTransition {
                        from: actual,
                        to: next,
                    }
                }
                other => other.into(),
            })?;
        metrics::counter!("order_status_transitions_total", "to" => next.as_str()).increment(1);
        tracing::info!(order_id = %id, status = %next, "order status updated");
        Ok(updated)
    }
}
