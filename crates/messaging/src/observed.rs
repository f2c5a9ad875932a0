use std::time::Instant;

use async_trait::async_trait;
use common::OrderId;
use domain::{EventPublisher, OrderEvent, PublishError};

/// Wraps an [`EventPublisher`] with publish counters, latency histograms and
/// spans.
#[derive(Debug, Clone)]
pub struct ObservedEventPublisher<P> {
    inner: P,
}

impl<P> ObservedEventPublisher<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

fn record(event_type: &'static str, order_id: &OrderId, start: Instant, result: &Result<(), PublishError>) {
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::counter!("events_published_total", "event_type" => event_type, "status" => status)
        .increment(1);
    metrics::histogram!("event_publish_duration_seconds", "event_type" => event_type)
        .record(start.elapsed().as_secs_f64());

    if let Err(e) = result {
        tracing::warn!(event_type, order_id = %order_id, error = %e, "event publish failed");
    }
}

#[async_trait]
impl<P: EventPublisher> EventPublisher for ObservedEventPublisher<P> {
    #[tracing::instrument(name = "EventPublisher::publish_order_created", skip(self))]
    async fn publish_order_created(&self, order_id: &OrderId) -> Result<(), PublishError> {
        let start = Instant::now();
        let result = self.inner.publish_order_created(order_id).await;
        record(OrderEvent::CREATED, order_id, start, &result);
        result
    }

    #[tracing::instrument(name = "EventPublisher::publish_order_processed", skip(self))]
    async fn publish_order_processed(&self, order_id: &OrderId) -> Result<(), PublishError> {
        let start = Instant::now();
        let result = self.inner.publish_order_processed(order_id).await;
        record(OrderEvent::PROCESSED, order_id, start, &result);
        result
    }

    #[tracing::instrument(name = "EventPublisher::publish_order_failed", skip(self))]
    async fn publish_order_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), PublishError> {
        let start = Instant::now();
        let result = self.inner.publish_order_failed(order_id, reason).await;
        record(OrderEvent::FAILED, order_id, start, &result);
        result
    }
}
