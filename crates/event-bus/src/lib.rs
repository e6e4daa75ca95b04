//! Event channel for the shopping saga services.
//!
//! Abstracts a partitioned, key-ordered, at-least-once publish/subscribe
//! transport. Envelopes sharing a `(topic, key)` pair land on the same
//! partition and are handled strictly sequentially; different keys may
//! be handled in parallel. Delivery is at-least-once: consumers must
//! tolerate duplicates, and a failed handler is retried under a bounded
//! [`RetryPolicy`] unless the failure is classified as not-found.

pub mod envelope;
pub mod handler;
pub mod memory;
pub mod retry;

pub use envelope::Envelope;
pub use handler::{EventChannel, EventHandler};
pub use memory::InMemoryEventBus;
pub use retry::RetryPolicy;
