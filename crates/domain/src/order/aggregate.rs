//! Order aggregate root.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::{OrderStatus, ValidationError, validate_fields};

/// A purchase request managed by the system.
///
/// Instances handed to callers are value copies; the order store owns the
/// durable representation. All persisted orders satisfy [`Order::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_email: String,
    amount_cents: i64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Constructs a new order in `pending` status and validates it.
    pub fn new_pending(
        id: OrderId,
        customer_email: impl Into<String>,
        amount_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let order = Self {
            id,
            customer_email: customer_email.into(),
            amount_cents,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        order.validate()?;
        Ok(order)
    }

    /// Rebuilds an order from its persisted representation.
    ///
    /// Stores use this to hand back value copies; the input is trusted.
    pub fn restore(
        id: OrderId,
        customer_email: String,
        amount_cents: i64,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_email,
            amount_cents,
            status,
            created_at,
            updated_at,
        }
    }

    /// Ensures the order adheres to business constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_blank() {
            return Err(ValidationError::OrderIdRequired);
        }
        validate_fields(&self.customer_email, self.amount_cents)
    }

    /// Moves the order to `next`, enforcing the status state machine.
    pub fn transition_to(&mut self, next: OrderStatus, at: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.record_status(next, at);
        Ok(())
    }

    /// Sets the status without consulting the state machine.
    ///
    /// Reserved for stores, which persist whatever the caller decided.
    /// `updated_at` never moves backwards.
    pub fn record_status(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = self.updated_at.max(at);
    }

    // Accessors

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn amount_cents(&self) -> i64 {
        self.amount_cents
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
