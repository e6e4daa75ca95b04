//! Order entity.

use chrono::{DateTime, Utc};
use common::{IdempotencyKey, LineItem, OrderId, OrderStatus, UserId};
use serde::{Deserialize, Serialize};

/// An order owned by the order service.
///
/// The `version` field is the optimistic concurrency token: every
/// mutation bumps it, and the store performs all status checks and
/// writes as one atomic step, so a REST update and an in-flight event
/// handler can never interleave a read-modify-write on the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    items: Vec<LineItem>,
    idempotency_key: IdempotencyKey,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Order {
    /// Creates a new order in `Pending` status.
    pub fn new(user_id: UserId, items: Vec<LineItem>, idempotency_key: IdempotencyKey) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Pending,
            items,
            idempotency_key,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn idempotency_key(&self) -> &IdempotencyKey {
        &self.idempotency_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Current optimistic concurrency token.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.touch();
    }

    pub(crate) fn replace_items(&mut self, items: Vec<LineItem>) {
        self.items = items;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_is_pending_at_version_one() {
        let order = Order::new(
            UserId::new(),
            vec![LineItem::new("U1", 2)],
            IdempotencyKey::new("k1"),
        );
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.version(), 1);
        assert_eq!(order.items().len(), 1);
    }

    #[test]
    fn mutations_bump_version_and_updated_at() {
        let mut order = Order::new(
            UserId::new(),
            vec![LineItem::new("U1", 2)],
            IdempotencyKey::new("k1"),
        );
        let before = order.updated_at();

        order.set_status(OrderStatus::Paid);
        assert_eq!(order.version(), 2);
        assert!(order.updated_at() >= before);

        order.replace_items(vec![LineItem::new("U2", 1)]);
        assert_eq!(order.version(), 3);
        assert_eq!(order.items()[0].catalog_id.as_str(), "U2");
    }
}
