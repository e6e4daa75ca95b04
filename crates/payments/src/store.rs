//! In-memory payment store.
//!
//! Two uniqueness constraints are enforced at the point of insert,
//! under one lock: at most one payment per order, and at most one
//! payment per idempotency key. Read-modify-write mutations run as a
//! single atomic step through [`PaymentStore::update_with`].

use std::collections::HashMap;
use std::sync::RwLock;

use common::{CoreError, IdempotencyGuard, IdempotencyKey, OrderId, PaymentId, PaymentStatus};

use crate::entity::Payment;

/// Outcome of cancellation propagation for an order's payment.
#[derive(Debug)]
pub enum CancelPaymentOutcome {
    /// The payment transitioned to `UserCanceled`.
    Canceled(Payment),
    /// The payment was already `UserCanceled`; redundant delivery.
    AlreadyCanceled(Payment),
}

#[derive(Default)]
struct Inner {
    payments: HashMap<PaymentId, Payment>,
    by_order: HashMap<OrderId, PaymentId>,
    guard: IdempotencyGuard<PaymentId>,
}

/// Thread-safe payment storage with unique indexes on order ID and
/// idempotency key.
#[derive(Default)]
pub struct PaymentStore {
    inner: RwLock<Inner>,
}

impl PaymentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new payment.
    ///
    /// The order-uniqueness check, the idempotency claim, and the
    /// insert form one atomic step: of two concurrent creations for
    /// the same order, exactly one succeeds and one gets `Conflict`.
    pub fn insert(&self, payment: Payment) -> Result<Payment, CoreError> {
        let mut inner = self.inner.write().unwrap();

        if inner.by_order.contains_key(&payment.order_id()) {
            return Err(CoreError::Conflict(format!(
                "payment already exists for order {}",
                payment.order_id()
            )));
        }
        inner
            .guard
            .claim(payment.idempotency_key().clone(), payment.id())?;

        inner.by_order.insert(payment.order_id(), payment.id());
        inner.payments.insert(payment.id(), payment.clone());
        Ok(payment)
    }

    /// Looks up a payment by ID.
    pub fn get(&self, payment_id: PaymentId) -> Option<Payment> {
        self.inner.read().unwrap().payments.get(&payment_id).cloned()
    }

    /// Looks up the payment for an order.
    pub fn get_by_order(&self, order_id: OrderId) -> Option<Payment> {
        let inner = self.inner.read().unwrap();
        let payment_id = inner.by_order.get(&order_id)?;
        inner.payments.get(payment_id).cloned()
    }

    /// Returns true if a payment exists for the order.
    pub fn exists_for_order(&self, order_id: OrderId) -> bool {
        self.inner.read().unwrap().by_order.contains_key(&order_id)
    }

    /// Returns true if an idempotency key has already been claimed.
    pub fn key_used(&self, key: &IdempotencyKey) -> bool {
        self.inner.read().unwrap().guard.lookup(key).is_some()
    }

    /// Runs an atomic read-modify-write on one payment.
    ///
    /// The closure sees the payment under the write lock; if it fails,
    /// nothing is persisted.
    pub fn update_with(
        &self,
        payment_id: PaymentId,
        mutate: impl FnOnce(&mut Payment) -> Result<(), CoreError>,
    ) -> Result<Payment, CoreError> {
        let mut inner = self.inner.write().unwrap();
        let payment = inner
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| CoreError::NotFound(format!("payment {payment_id} not found")))?;

        let mut staged = payment.clone();
        mutate(&mut staged)?;
        *payment = staged.clone();
        Ok(staged)
    }

    /// Cancels the payment associated with an order.
    ///
    /// A `Successful` payment cannot be canceled; an already canceled
    /// one is reported as redundant.
    pub fn cancel_for_order(&self, order_id: OrderId) -> Result<CancelPaymentOutcome, CoreError> {
        let mut inner = self.inner.write().unwrap();
        let payment_id = *inner
            .by_order
            .get(&order_id)
            .ok_or_else(|| CoreError::NotFound(format!("no payment for order {order_id}")))?;
        let payment = inner
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| CoreError::NotFound(format!("payment {payment_id} not found")))?;

        match payment.status() {
            PaymentStatus::Successful => Err(CoreError::InvalidState(
                "a successful payment cannot be canceled".to_string(),
            )),
            PaymentStatus::UserCanceled => Ok(CancelPaymentOutcome::AlreadyCanceled(payment.clone())),
            _ => {
                payment.set_status(PaymentStatus::UserCanceled);
                Ok(CancelPaymentOutcome::Canceled(payment.clone()))
            }
        }
    }

    /// Number of stored payments.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().payments.len()
    }

    /// Returns true if the store holds no payments.
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().payments.is_empty()
    }
}
