//! Idempotency guard around the create-order pipeline.

use common::IdempotencyKey;
use serde::Serialize;

use crate::command::CreateOrderHandler;
use crate::error::{DomainError, PublishError};
use crate::order::{CreateOrder, Order};
use crate::ports::{EventPublisher, IdempotencyStore, OrderStore, StoredResponse};

/// Status code recorded for an accepted order creation.
pub const ORDER_ACCEPTED_STATUS: u16 = 202;

/// What the guard hands back to the request boundary.
#[derive(Debug, Clone)]
pub struct GuardOutcome {
    /// The response to return, byte-for-byte identical on every replay.
    ///
    /// When a concurrent first request under the same key recorded its
    /// response first, this is still the caller's own response, so
    /// `response.order_id` can differ from what later retries of the key get.
    pub response: StoredResponse,

    /// True if the response came from the idempotency store.
    pub replayed: bool,

    /// Set when this execution persisted the order but failed to publish
    /// `order.created`. Never set on replays.
    pub publish_error: Option<PublishError>,
}

/// Replay check keyed by the caller's idempotency key.
///
/// 1. Look the key up.
/// 2. On a hit, return the stored response verbatim without re-validating
///    or re-executing anything.
/// 3. On a miss, run the pipeline, build the replayable response from the
///    persisted order (also when only the publish failed) and save it before
///    returning.
///
/// Two concurrent first submissions of one key both miss and each create an
/// order. The store's first-writer-wins rule decides which response every
/// later retry sees.
pub struct IdempotencyGuard<O, P, I> {
    handler: CreateOrderHandler<O, P>,
    store: I,
}

impl<O, P, I> IdempotencyGuard<O, P, I>
where
    O: OrderStore,
    P: EventPublisher,
    I: IdempotencyStore,
{
    /// Wraps a handler with the given idempotency store.
    pub fn new(handler: CreateOrderHandler<O, P>, store: I) -> Self {
        Self { handler, store }
    }

    /// Returns a reference to the wrapped handler.
    pub fn handler(&self) -> &CreateOrderHandler<O, P> {
        &self.handler
    }

    /// Returns a reference to the idempotency store.
    pub fn store(&self) -> &I {
        &self.store
    }

    /// Returns the stored outcome for a key that has already been used.
    ///
    /// Lets the request boundary answer a retry before decoding its payload.
    #[tracing::instrument(skip(self), fields(idempotency_key = %key))]
    pub async fn replay(&self, key: &IdempotencyKey) -> Result<Option<GuardOutcome>, DomainError> {
        let Some(response) = self.store.get(key).await? else {
            return Ok(None);
        };

        tracing::info!(order_id = %response.order_id, "replaying stored response");
        metrics::counter!("idempotency_replays_total").increment(1);
        Ok(Some(GuardOutcome {
            response,
            replayed: true,
            publish_error: None,
        }))
    }

    /// Executes the command at most once per key.
    ///
    /// Validation and store failures are returned without recording anything,
    /// so the caller may correct the request and retry under the same key.
    #[tracing::instrument(skip(self, cmd), fields(idempotency_key = %key))]
    pub async fn execute(
        &self,
        key: &IdempotencyKey,
        cmd: CreateOrder,
    ) -> Result<GuardOutcome, DomainError> {
        if let Some(outcome) = self.replay(key).await? {
            return Ok(outcome);
        }

        let (order, publish_error) = match self.handler.handle(cmd).await {
            Ok(order) => (order, None),
            Err(DomainError::PublishFailed { order, source }) => (*order, Some(source)),
            Err(e) => return Err(e),
        };

        let response = accepted_response(&order)?;

        let retained = self.store.save(key, &response).await?;
        if !retained {
            tracing::warn!(
                order_id = %order.id(),
                "concurrent submission already recorded a response for this key"
            );
            metrics::counter!("idempotency_races_total").increment(1);
        }

        Ok(GuardOutcome {
            response,
            replayed: false,
            publish_error,
        })
    }
}

#[derive(Serialize)]
struct OrderBody<'a> {
    order: &'a Order,
}

/// Builds the replayable `202 Accepted` response for a persisted order.
pub fn accepted_response(order: &Order) -> Result<StoredResponse, serde_json::Error> {
    Ok(StoredResponse {
        status_code: ORDER_ACCEPTED_STATUS,
        body: serde_json::to_vec(&OrderBody { order })?,
        order_id: order.id().clone(),
    })
}
