//! Order lifecycle events emitted to the external bus.

use common::OrderId;
use serde::{Deserialize, Serialize};

/// Logical lifecycle events. Delivery is at-least-once; consumers must be idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderEvent {
    #[serde(rename = "order.created")]
    Created { order_id: OrderId },

    #[serde(rename = "order.processed")]
    Processed { order_id: OrderId },

    #[serde(rename = "order.failed")]
    Failed { order_id: OrderId, reason: String },
}

impl OrderEvent {
    pub const CREATED: &'static str = "order.created";
    pub const PROCESSED: &'static str = "order.processed";
    pub const FAILED: &'static str = "order.failed";

    pub fn created(order_id: OrderId) -> Self {
        OrderEvent::Created { order_id }
    }

    pub fn processed(order_id: OrderId) -> Self {
        OrderEvent::Processed { order_id }
    }

    pub fn failed(order_id: OrderId, reason: impl Into<String>) -> Self {
        OrderEvent::Failed {
            order_id,
            reason: reason.into(),
        }
    }

    /// Returns the event type name, which doubles as the topic name.
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created { .. } => Self::CREATED,
            OrderEvent::Processed { .. } => Self::PROCESSED,
            OrderEvent::Failed { .. } => Self::FAILED,
        }
    }

    /// Returns the order this event refers to.
    pub fn order_id(&self) -> &OrderId {
        match self {
            OrderEvent::Created { order_id }
            | OrderEvent::Processed { order_id }
            | OrderEvent::Failed { order_id, .. } => order_id,
        }
    }

    /// Returns the failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            OrderEvent::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names() {
        let id = OrderId::new("o-1");
        assert_eq!(OrderEvent::created(id.clone()).event_type(), "order.created");
        assert_eq!(
            OrderEvent::processed(id.clone()).event_type(),
            "order.processed"
        );
        assert_eq!(OrderEvent::failed(id, "boom").event_type(), "order.failed");
    }

    #[test]
    fn failed_event_carries_reason() {
        let event = OrderEvent::failed(OrderId::new("o-1"), "card declined");
        assert_eq!(event.reason(), Some("card declined"));
        assert_eq!(event.order_id().as_str(), "o-1");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(OrderEvent::created(OrderId::new("o-1"))).unwrap();
        assert_eq!(json["type"], "order.created");
        assert_eq!(json["order_id"], "o-1");
    }
}
