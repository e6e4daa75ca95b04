//! Wire events exchanged between the services.
//!
//! Both topics are keyed by order ID, so every event concerning a
//! single order is delivered to one logical consumer in emission order.

use serde::{Deserialize, Serialize};

use crate::types::{CatalogId, OrderId, UserId};

/// Topic carrying order lifecycle transitions (creation, paid fan-out,
/// user cancellation). Consumed by the payment and inventory services.
pub const TOPIC_ORDER_LIFECYCLE: &str = "order-lifecycle";

/// Topic carrying payment outcomes mapped to order statuses. Consumed
/// by the order service.
pub const TOPIC_PAYMENT_STATUS: &str = "payment-status";

/// Order status state machine.
///
/// ```text
/// Pending ──┬──► Paid
///           ├──► PaymentFailed ──┐
///           ├──► Canceled        ├──► (further payment outcomes)
///           ├──► RepayNeeded ────┘
///           └──► UserCanceled        (also from RepayNeeded)
/// ```
///
/// `Paid` and `UserCanceled` are terminal: no item updates, no further
/// status writes, no cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order created, awaiting a payment outcome.
    #[default]
    Pending,

    /// Payment settled successfully (terminal).
    Paid,

    /// Payment declined for insufficient funds.
    PaymentFailed,

    /// Payment flagged as fraudulent.
    Canceled,

    /// Chargeback initiated, a new payment attempt is needed.
    RepayNeeded,

    /// Canceled by the user (terminal).
    UserCanceled,
}

impl OrderStatus {
    /// Returns true if items can still be modified.
    pub fn can_modify_items(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the user can cancel the order in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::RepayNeeded)
    }

    /// Returns true if no further mutation is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::UserCanceled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::PaymentFailed => "PaymentFailed",
            OrderStatus::Canceled => "Canceled",
            OrderStatus::RepayNeeded => "RepayNeeded",
            OrderStatus::UserCanceled => "UserCanceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a (mocked) payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Settled (terminal: no further field mutation permitted).
    Successful,
    InsufficientFunds,
    Fraudulent,
    ChargebackInitiated,
    /// Canceled by the user via cancellation propagation (terminal).
    UserCanceled,
}

impl PaymentStatus {
    /// Maps a payment outcome to the order status it drives.
    pub fn order_status(&self) -> OrderStatus {
        match self {
            PaymentStatus::Successful => OrderStatus::Paid,
            PaymentStatus::InsufficientFunds => OrderStatus::PaymentFailed,
            PaymentStatus::Fraudulent => OrderStatus::Canceled,
            PaymentStatus::ChargebackInitiated => OrderStatus::RepayNeeded,
            PaymentStatus::UserCanceled => OrderStatus::UserCanceled,
        }
    }

    /// Returns true if no further field mutation is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Successful | PaymentStatus::UserCanceled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Successful => "Successful",
            PaymentStatus::InsufficientFunds => "InsufficientFunds",
            PaymentStatus::Fraudulent => "Fraudulent",
            PaymentStatus::ChargebackInitiated => "ChargebackInitiated",
            PaymentStatus::UserCanceled => "UserCanceled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ordered line of an order: catalog reference plus quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub catalog_id: CatalogId,
    pub quantity: u32,
}

impl LineItem {
    /// Creates a line item.
    pub fn new(catalog_id: impl Into<CatalogId>, quantity: u32) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            quantity,
        }
    }
}

/// Payload published on [`TOPIC_ORDER_LIFECYCLE`], keyed by order ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLifecycleEvent {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub order_status: OrderStatus,
    pub items: Vec<LineItem>,
}

/// Payload published on [`TOPIC_PAYMENT_STATUS`], keyed by order ID.
///
/// `status` is the order-status value the outcome maps to; `reason`
/// is the underlying payment outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusEvent {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub reason: PaymentStatus,
}
