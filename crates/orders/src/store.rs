//! In-memory order store.
//!
//! Stands in for the order service's own database. Every mutation runs
//! under one write lock, so the status check and the write it guards
//! form a single atomic step (the conditional-update discipline a real
//! store would express with a version column), and the idempotency
//! claim is atomic with the insert it protects.

use std::collections::HashMap;
use std::sync::RwLock;

use common::{CoreError, IdempotencyGuard, LineItem, OrderId, OrderStatus, UserId};

use crate::entity::Order;

/// Outcome of a user cancellation attempt.
#[derive(Debug)]
pub enum CancelOutcome {
    /// The order transitioned to `UserCanceled`.
    Canceled(Order),
    /// The order was already `UserCanceled`; redundant request.
    AlreadyCanceled(Order),
}

/// Outcome of applying a payment-driven status update.
#[derive(Debug)]
pub enum StatusApplied {
    /// The new status was persisted.
    Applied(Order),
    /// The order is in a terminal status; the update was ignored.
    IgnoredTerminal(Order),
}

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    guard: IdempotencyGuard<OrderId>,
}

/// Thread-safe order storage with a unique index on the idempotency key.
#[derive(Default)]
pub struct OrderStore {
    inner: RwLock<Inner>,
}

impl OrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new order.
    ///
    /// The idempotency claim and the insert happen under one lock:
    /// two concurrent creations with the same key get exactly one
    /// success and one `Conflict`, with the original order untouched.
    pub fn insert(&self, order: Order) -> Result<Order, CoreError> {
        let mut inner = self.inner.write().unwrap();
        inner
            .guard
            .claim(order.idempotency_key().clone(), order.id())?;
        inner.orders.insert(order.id(), order.clone());
        Ok(order)
    }

    /// Looks up an order by ID.
    pub fn get(&self, order_id: OrderId) -> Option<Order> {
        self.inner.read().unwrap().orders.get(&order_id).cloned()
    }

    /// Returns all orders owned by a user, newest first.
    pub fn list_by_user(&self, user_id: UserId) -> Vec<Order> {
        let inner = self.inner.read().unwrap();
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.user_id() == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        orders
    }

    /// Replaces the item list of a `Pending` order.
    pub fn update_items(&self, order_id: OrderId, items: Vec<LineItem>) -> Result<Order, CoreError> {
        let mut inner = self.inner.write().unwrap();
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| CoreError::NotFound(format!("order {order_id} not found")))?;

        if !order.status().can_modify_items() {
            return Err(CoreError::InvalidState(format!(
                "order {order_id} is {} and its items can no longer be changed",
                order.status()
            )));
        }

        order.replace_items(items);
        Ok(order.clone())
    }

    /// Transitions an order to `UserCanceled`.
    ///
    /// Canceling an already-canceled order is reported as redundant
    /// rather than an error; any other non-cancelable status fails
    /// `InvalidState`.
    pub fn cancel(&self, order_id: OrderId) -> Result<CancelOutcome, CoreError> {
        let mut inner = self.inner.write().unwrap();
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| CoreError::NotFound(format!("order {order_id} not found")))?;

        if order.status() == OrderStatus::UserCanceled {
            return Ok(CancelOutcome::AlreadyCanceled(order.clone()));
        }
        if !order.status().can_cancel() {
            return Err(CoreError::InvalidState(format!(
                "order {order_id} is {} and cannot be canceled",
                order.status()
            )));
        }

        order.set_status(OrderStatus::UserCanceled);
        Ok(CancelOutcome::Canceled(order.clone()))
    }

    /// Applies a payment-driven status update.
    ///
    /// Terminal orders are left untouched: a late payment outcome for
    /// a paid or user-canceled order is reported as ignored, never
    /// clobbering the terminal status.
    pub fn apply_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<StatusApplied, CoreError> {
        let mut inner = self.inner.write().unwrap();
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| CoreError::NotFound(format!("order {order_id} not found")))?;

        if order.status().is_terminal() {
            return Ok(StatusApplied::IgnoredTerminal(order.clone()));
        }

        order.set_status(status);
        Ok(StatusApplied::Applied(order.clone()))
    }

    /// Administrative delete. Releases the idempotency claim.
    pub fn delete(&self, order_id: OrderId) -> Result<(), CoreError> {
        let mut inner = self.inner.write().unwrap();
        let order = inner
            .orders
            .remove(&order_id)
            .ok_or_else(|| CoreError::NotFound(format!("order {order_id} not found")))?;
        let key = order.idempotency_key().clone();
        inner.guard.release(&key);
        Ok(())
    }

    /// Number of stored orders.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().orders.len()
    }

    /// Returns true if the store holds no orders.
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::IdempotencyKey;

    fn pending_order(key: &str) -> Order {
        Order::new(
            UserId::new(),
            vec![LineItem::new("U1", 2)],
            IdempotencyKey::new(key),
        )
    }

    #[test]
    fn insert_and_get() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();
        let loaded = store.get(order.id()).unwrap();
        assert_eq!(loaded.id(), order.id());
        assert_eq!(loaded.status(), OrderStatus::Pending);
    }

    #[test]
    fn duplicate_idempotency_key_conflicts() {
        let store = OrderStore::new();
        let first = store.insert(pending_order("k1")).unwrap();

        let result = store.insert(pending_order("k1"));
        assert!(matches!(result, Err(CoreError::Conflict(_))));

        // The original order is unaffected.
        assert_eq!(store.len(), 1);
        assert!(store.get(first.id()).is_some());
    }

    #[test]
    fn update_items_only_while_pending() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();

        let updated = store
            .update_items(order.id(), vec![LineItem::new("U2", 3)])
            .unwrap();
        assert_eq!(updated.items()[0].catalog_id.as_str(), "U2");
        assert_eq!(updated.version(), 2);

        store
            .apply_status(order.id(), OrderStatus::Paid)
            .unwrap();
        let result = store.update_items(order.id(), vec![LineItem::new("U3", 1)]);
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn update_items_unknown_order_is_not_found() {
        let store = OrderStore::new();
        let result = store.update_items(OrderId::new(), vec![LineItem::new("U1", 1)]);
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[test]
    fn cancel_pending_order() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();

        match store.cancel(order.id()).unwrap() {
            CancelOutcome::Canceled(o) => assert_eq!(o.status(), OrderStatus::UserCanceled),
            CancelOutcome::AlreadyCanceled(_) => panic!("expected a fresh cancellation"),
        }
    }

    #[test]
    fn cancel_repay_needed_order() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();
        store
            .apply_status(order.id(), OrderStatus::RepayNeeded)
            .unwrap();

        assert!(matches!(
            store.cancel(order.id()).unwrap(),
            CancelOutcome::Canceled(_)
        ));
    }

    #[test]
    fn cancel_of_canceled_is_redundant_not_an_error() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();
        store.cancel(order.id()).unwrap();

        match store.cancel(order.id()).unwrap() {
            CancelOutcome::AlreadyCanceled(o) => {
                assert_eq!(o.status(), OrderStatus::UserCanceled);
            }
            CancelOutcome::Canceled(_) => panic!("expected redundant outcome"),
        }
    }

    #[test]
    fn cancel_paid_order_fails() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();
        store.apply_status(order.id(), OrderStatus::Paid).unwrap();

        let result = store.cancel(order.id());
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn apply_status_skips_terminal_orders() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();
        store.cancel(order.id()).unwrap();

        match store.apply_status(order.id(), OrderStatus::Paid).unwrap() {
            StatusApplied::IgnoredTerminal(o) => {
                assert_eq!(o.status(), OrderStatus::UserCanceled);
            }
            StatusApplied::Applied(_) => panic!("terminal status must not be clobbered"),
        }
    }

    #[test]
    fn apply_status_allows_retry_after_failure() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();

        store
            .apply_status(order.id(), OrderStatus::PaymentFailed)
            .unwrap();
        match store.apply_status(order.id(), OrderStatus::Paid).unwrap() {
            StatusApplied::Applied(o) => assert_eq!(o.status(), OrderStatus::Paid),
            StatusApplied::IgnoredTerminal(_) => panic!("PaymentFailed is not terminal"),
        }
    }

    #[test]
    fn delete_releases_idempotency_key() {
        let store = OrderStore::new();
        let order = store.insert(pending_order("k1")).unwrap();
        store.delete(order.id()).unwrap();

        assert!(store.is_empty());
        // Key is free again after the administrative delete.
        assert!(store.insert(pending_order("k1")).is_ok());
    }

    #[test]
    fn list_by_user_filters_and_orders() {
        let store = OrderStore::new();
        let user = UserId::new();

        let mine = Order::new(user, vec![LineItem::new("U1", 1)], IdempotencyKey::new("k1"));
        store.insert(mine).unwrap();
        store.insert(pending_order("k2")).unwrap();

        let listed = store.list_by_user(user);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_id(), user);
    }
}
