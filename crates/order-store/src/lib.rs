//! Store implementations for the order service.
//!
//! Both ports come in two flavors: an in-memory map for tests and local
//! runs, and a PostgreSQL-backed store. [`observed`] wraps either with
//! latency metrics.

pub mod memory;
pub mod observed;
pub mod postgres;

pub use memory::{InMemoryIdempotencyStore, InMemoryOrderStore};
pub use observed::{ObservedIdempotencyStore, ObservedOrderStore};
pub use postgres::{PostgresIdempotencyStore, PostgresOrderStore};
