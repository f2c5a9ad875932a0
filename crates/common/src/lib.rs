//! Shared identifier types.

pub mod types;

pub use types::{IdempotencyKey, MAX_IDEMPOTENCY_KEY_LEN, OrderId};
