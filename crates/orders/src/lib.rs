//! Order service.
//!
//! Owns the order lifecycle: idempotent creation, item updates, user
//! cancellation, and the saga reaction to payment outcomes. Orders in
//! `Paid` status fan out an inventory-decrement event; orders canceled
//! by the user fan out a cancellation event the payment service reacts
//! to. Cross-service relationships are lookup keys only, resolved
//! through the event channel.

pub mod entity;
pub mod handler;
pub mod service;
pub mod store;

pub use entity::Order;
pub use handler::PaymentStatusHandler;
pub use service::OrderService;
pub use store::OrderStore;
