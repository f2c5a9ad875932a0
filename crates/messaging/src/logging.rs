use async_trait::async_trait;
use common::OrderId;
use domain::{EventPublisher, OrderEvent, PublishError};

use crate::EventEnvelope;

/// Publisher that logs events instead of sending them to a broker.
///
/// Used for local runs before a real bus is wired in. Never fails unless an
/// event cannot be encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, event: OrderEvent) -> Result<(), PublishError> {
        let payload = EventEnvelope::wrap(&event).encode()?;
        tracing::debug!(
            event_type = event.event_type(),
            order_id = %event.order_id(),
            payload = %String::from_utf8_lossy(&payload),
            "event published to log"
        );
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish_order_created(&self, order_id: &OrderId) -> Result<(), PublishError> {
        self.emit(OrderEvent::created(order_id.clone()))
    }

    async fn publish_order_processed(&self, order_id: &OrderId) -> Result<(), PublishError> {
        self.emit(OrderEvent::processed(order_id.clone()))
    }

    async fn publish_order_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), PublishError> {
        self.emit(OrderEvent::failed(order_id.clone(), reason))
    }
}
