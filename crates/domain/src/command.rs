//! Create-order command pipeline.

use std::time::Instant;

use chrono::Utc;
use common::OrderId;

use crate::error::DomainError;
use crate::order::{CreateOrder, Order};
use crate::ports::{EventPublisher, OrderStore};

/// Handler for the create-order command.
///
/// The handler is responsible for:
/// 1. Validating the command (no side effects on failure)
/// 2. Building a `pending` order under a freshly generated identifier
/// 3. Persisting it through the order store
/// 4. Publishing `order.created`
///
/// A publish failure after a successful write is reported as
/// [`DomainError::PublishFailed`], which carries the persisted order. The
/// write is never rolled back.
pub struct CreateOrderHandler<O, P> {
    orders: O,
    publisher: P,
}

impl<O, P> CreateOrderHandler<O, P>
where
    O: OrderStore,
    P: EventPublisher,
{
    /// Creates a new handler over the given store and publisher.
    pub fn new(orders: O, publisher: P) -> Self {
        Self { orders, publisher }
    }

    /// Returns a reference to the underlying order store.
    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Returns a reference to the underlying event publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Executes the command.
    #[tracing::instrument(skip(self, cmd), fields(amount_cents = cmd.amount_cents))]
    pub async fn handle(&self, cmd: CreateOrder) -> Result<Order, DomainError> {
        let start = Instant::now();
        let result = self.execute(cmd).await;

        let status = match &result {
            Ok(_) => "success",
            Err(DomainError::PublishFailed { .. }) => "publish_failed",
            Err(_) => "error",
        };
        metrics::counter!("orders_created_total", "status" => status).increment(1);
        metrics::histogram!("order_creation_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn execute(&self, cmd: CreateOrder) -> Result<Order, DomainError> {
        cmd.validate()?;

        let order = Order::new_pending(
            OrderId::generate(),
            cmd.customer_email,
            cmd.amount_cents,
            Utc::now(),
        )?;

        self.orders.create(&order).await?;
        tracing::info!(order_id = %order.id(), "order persisted");

        if let Err(source) = self.publisher.publish_order_created(order.id()).await {
            tracing::warn!(
                order_id = %order.id(),
                error = %source,
                "order saved but order.created was not published"
            );
            return Err(DomainError::PublishFailed {
                order: Box::new(order),
                source,
            });
        }

        Ok(order)
    }
}
