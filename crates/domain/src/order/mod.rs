//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod filter;
mod service;
mod state;

pub use aggregate::Order;
pub use commands::CreateOrder;
pub use events::OrderEvent;
pub use filter::ListFilter;
pub use service::OrderService;
pub use state::OrderStatus;

use thiserror::Error;

/// Malformed input. Never accompanied by a side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Customer email is missing or blank.
    #[error("customer_email is required")]
    EmailRequired,

    /// Customer email is not syntactically valid.
    #[error("customer_email must be valid")]
    EmailInvalid,

    /// Amount is zero or negative.
    #[error("amount_cents must be positive (got {amount_cents})")]
    AmountNotPositive { amount_cents: i64 },

    /// Order identifier is missing or blank.
    #[error("order_id is required")]
    OrderIdRequired,

    /// Status string does not name a known status.
    #[error("unknown order status: {0}")]
    UnknownStatus(String),
}

/// Checks the customer email and amount shared by commands and the aggregate.
pub(crate) fn validate_fields(customer_email: &str, amount_cents: i64) -> Result<(), ValidationError> {
    if customer_email.trim().is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !customer_email.contains('@') {
        return Err(ValidationError::EmailInvalid);
    }
    if amount_cents <= 0 {
        return Err(ValidationError::AmountNotPositive { amount_cents });
    }
    Ok(())
}
