//! Payment service.
//!
//! Owns the payment lifecycle for an order: idempotent creation with
//! card validation, a mocked settlement outcome drawn from a
//! configurable probability table, outcome re-draws on update, and the
//! cancellation reaction to user-canceled orders. Every outcome is
//! published as a payment-status event keyed by the order ID so the
//! order saga applies updates in emission order.

pub mod entity;
pub mod handler;
pub mod outcome;
pub mod service;
pub mod store;
pub mod validate;

pub use entity::{CardDetails, CardUpdate, Payment};
pub use handler::OrderLifecycleHandler;
pub use outcome::{DrawSource, FixedDraws, OutcomePolicy, UniformDraws};
pub use service::PaymentService;
pub use store::PaymentStore;
