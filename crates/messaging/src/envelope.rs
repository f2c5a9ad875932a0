//! Wire envelope for lifecycle events.

use chrono::{DateTime, Utc};
use domain::{OrderEvent, PublishError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The message that goes on the bus for one [`OrderEvent`].
///
/// `event_id` is fresh per publish attempt, so consumers must deduplicate by
/// `order_id` and `event_type` rather than by `event_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event_type: String,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Wraps an event with a new event ID and the current time.
    pub fn wrap(event: &OrderEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event.event_type().to_string(),
            order_id: event.order_id().to_string(),
            reason: event.reason().map(str::to_string),
            occurred_at: Utc::now(),
        }
    }

    /// Serializes the envelope to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, PublishError> {
        serde_json::to_vec(self).map_err(|e| PublishError::Encoding(e.to_string()))
    }
}
