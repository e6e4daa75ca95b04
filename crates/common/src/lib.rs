//! Shared vocabulary for the shopping saga services.
//!
//! Holds the typed identifiers, the cross-service error taxonomy, the
//! wire event payloads exchanged over the event channel, and the
//! idempotency guard used at the point of durable insert.

pub mod error;
pub mod events;
pub mod idempotency;
pub mod types;

pub use error::CoreError;
pub use events::{
    LineItem, OrderLifecycleEvent, OrderStatus, PaymentStatus, PaymentStatusEvent,
    TOPIC_ORDER_LIFECYCLE, TOPIC_PAYMENT_STATUS,
};
pub use idempotency::IdempotencyGuard;
pub use types::{CatalogId, IdempotencyKey, OrderId, PaymentId, UserId};
