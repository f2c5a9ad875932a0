use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{EventPublisher, OrderEvent, PublishError};

use crate::EventEnvelope;

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    events: Vec<OrderEvent>,
    fail_on_publish: bool,
}

/// In-memory publisher for testing.
///
/// Records every delivered event in order. While `fail_on_publish` is set,
/// publishing fails with [`PublishError::Unavailable`] and nothing is
/// recorded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to fail subsequent publish calls.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_publish = fail;
    }

    /// Returns a copy of every event delivered so far.
    pub fn events(&self) -> Vec<OrderEvent> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .clone()
    }

    /// Returns the delivered events of one type.
    pub fn events_of_type(&self, event_type: &str) -> Vec<OrderEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Returns the number of delivered events.
    pub fn event_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .len()
    }

    fn deliver(&self, event: OrderEvent) -> Result<(), PublishError> {
        EventEnvelope::wrap(&event).encode()?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_publish {
            return Err(PublishError::Unavailable(format!(
                "publisher configured to fail {}",
                event.event_type()
            )));
        }
        state.events.push(event);
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish_order_created(&self, order_id: &OrderId) -> Result<(), PublishError> {
        self.deliver(OrderEvent::created(order_id.clone()))
    }

    async fn publish_order_processed(&self, order_id: &OrderId) -> Result<(), PublishError> {
        self.deliver(OrderEvent::processed(order_id.clone()))
    }

    async fn publish_order_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), PublishError> {
        self.deliver(OrderEvent::failed(order_id.clone(), reason))
    }
}
