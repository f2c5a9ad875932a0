//! Event publishers for order lifecycle events.
//!
//! - [`LoggingEventPublisher`] writes events to the log instead of a broker
//! - [`InMemoryEventPublisher`] records events for tests and can be told to fail
//! - [`ObservedEventPublisher`] wraps any publisher with metrics and spans

pub mod envelope;
pub mod logging;
pub mod memory;
pub mod observed;

pub use envelope::EventEnvelope;
pub use logging::LoggingEventPublisher;
pub use memory::InMemoryEventPublisher;
pub use observed::ObservedEventPublisher;
