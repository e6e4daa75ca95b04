//! Order service operations.

use std::sync::Arc;

use common::{
    CoreError, IdempotencyKey, LineItem, OrderId, OrderLifecycleEvent, OrderStatus,
    PaymentStatusEvent, TOPIC_ORDER_LIFECYCLE, UserId,
};
use event_bus::{Envelope, EventChannel};

use crate::entity::Order;
use crate::store::{CancelOutcome, OrderStore, StatusApplied};

/// The order saga: creation, item updates, user cancellation, and the
/// reaction to payment outcomes.
pub struct OrderService {
    store: OrderStore,
    channel: Arc<dyn EventChannel>,
}

impl OrderService {
    /// Creates the service on top of its store and the event channel.
    pub fn new(store: OrderStore, channel: Arc<dyn EventChannel>) -> Self {
        Self { store, channel }
    }

    /// Creates an order in `Pending` status.
    ///
    /// Duplicate idempotency keys fail `Conflict`; the uniqueness claim
    /// is atomic with the insert, so concurrent identical requests get
    /// exactly one order. Success publishes an order-lifecycle event
    /// keyed by the order ID.
    #[tracing::instrument(skip(self, items))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        items: Vec<LineItem>,
        idempotency_key: IdempotencyKey,
    ) -> Result<Order, CoreError> {
        validate_items(&items)?;

        let order = self
            .store
            .insert(Order::new(user_id, items, idempotency_key))?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), "order created");

        self.publish_lifecycle(&order).await;
        Ok(order)
    }

    /// Replaces the item list of a `Pending` order.
    #[tracing::instrument(skip(self, items))]
    pub async fn update_items(
        &self,
        order_id: OrderId,
        items: Vec<LineItem>,
    ) -> Result<Order, CoreError> {
        validate_items(&items)?;
        self.store.update_items(order_id, items)
    }

    /// Cancels an order on the user's behalf.
    ///
    /// Allowed from `Pending` or `RepayNeeded`. Canceling an order that
    /// is already `UserCanceled` is a redundant no-op success and does
    /// not re-publish the cancellation event. The published event is
    /// what propagates the cancellation to the payment service.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order, CoreError> {
        match self.store.cancel(order_id)? {
            CancelOutcome::Canceled(order) => {
                metrics::counter!("orders_canceled_total").increment(1);
                tracing::info!(order_id = %order_id, "order canceled by user");
                self.publish_lifecycle(&order).await;
                Ok(order)
            }
            CancelOutcome::AlreadyCanceled(order) => {
                tracing::info!(order_id = %order_id, "order already canceled, redundant request");
                Ok(order)
            }
        }
    }

    /// Loads an order by ID.
    pub fn get_order(&self, order_id: OrderId) -> Result<Order, CoreError> {
        self.store
            .get(order_id)
            .ok_or_else(|| CoreError::NotFound(format!("order {order_id} not found")))
    }

    /// Lists a user's orders, newest first.
    pub fn list_orders_for_user(&self, user_id: UserId) -> Vec<Order> {
        self.store.list_by_user(user_id)
    }

    /// Administrative delete, outside the saga.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), CoreError> {
        self.store.delete(order_id)
    }

    /// Applies a payment outcome to the order it references.
    ///
    /// Event-driven, not a public API. Unknown orders fail `NotFound`
    /// and are discarded by the channel. Terminal orders ignore the
    /// update. When the new status is `Paid`, a lifecycle event carrying
    /// the line items is published so the inventory service decrements
    /// stock; decrement failures do not flow back into order status.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id, status = %event.status))]
    pub async fn apply_payment_status(&self, event: PaymentStatusEvent) -> Result<(), CoreError> {
        match self.store.apply_status(event.order_id, event.status)? {
            StatusApplied::Applied(order) => {
                metrics::counter!("order_status_updates_total").increment(1);
                tracing::info!(
                    order_id = %event.order_id,
                    status = %event.status,
                    reason = %event.reason,
                    "order status updated from payment outcome"
                );

                if order.status() == OrderStatus::Paid {
                    self.publish_lifecycle(&order).await;
                }
                Ok(())
            }
            StatusApplied::IgnoredTerminal(order) => {
                tracing::warn!(
                    order_id = %event.order_id,
                    current = %order.status(),
                    incoming = %event.status,
                    "payment outcome ignored, order is terminal"
                );
                Ok(())
            }
        }
    }

    /// Publishes the order's current state on the lifecycle topic.
    ///
    /// A publish failure is logged, not surfaced: creation and
    /// cancellation have already committed, and the transport is
    /// at-least-once, not transactional with the store.
    async fn publish_lifecycle(&self, order: &Order) {
        let event = OrderLifecycleEvent {
            order_id: order.id(),
            user_id: order.user_id(),
            order_status: order.status(),
            items: order.items().to_vec(),
        };

        let envelope = match Envelope::new(TOPIC_ORDER_LIFECYCLE, order.id().to_string(), &event) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(order_id = %order.id(), error = %e, "failed to encode lifecycle event");
                return;
            }
        };

        if let Err(e) = self.channel.publish(envelope).await {
            tracing::error!(order_id = %order.id(), error = %e, "failed to publish lifecycle event");
        }
    }
}

fn validate_items(items: &[LineItem]) -> Result<(), CoreError> {
    if items.is_empty() {
        return Err(CoreError::InvalidData("order has no items".to_string()));
    }
    for item in items {
        if item.quantity == 0 {
            return Err(CoreError::InvalidData(format!(
                "quantity for {} must be at least 1",
                item.catalog_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::PaymentStatus;
    use event_bus::{InMemoryEventBus, RetryPolicy};

    fn setup() -> (OrderService, InMemoryEventBus) {
        let bus = InMemoryEventBus::new(2, RetryPolicy::fast());
        let service = OrderService::new(OrderStore::new(), Arc::new(bus.clone()));
        (service, bus)
    }

    fn items() -> Vec<LineItem> {
        vec![LineItem::new("U1", 2)]
    }

    #[tokio::test]
    async fn create_order_is_pending() {
        let (service, _) = setup();
        let order = service
            .create_order(UserId::new(), items(), IdempotencyKey::new("k1"))
            .await
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn repeated_creation_with_same_key_conflicts() {
        let (service, _) = setup();
        let user = UserId::new();
        let first = service
            .create_order(user, items(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        for _ in 0..3 {
            let result = service
                .create_order(user, items(), IdempotencyKey::new("k1"))
                .await;
            assert!(matches!(result, Err(CoreError::Conflict(_))));
        }

        // The original order is durably the only one.
        assert!(service.get_order(first.id()).is_ok());
        assert_eq!(service.list_orders_for_user(user).len(), 1);
    }

    #[tokio::test]
    async fn create_order_rejects_empty_or_zero_quantity_items() {
        let (service, _) = setup();

        let result = service
            .create_order(UserId::new(), vec![], IdempotencyKey::new("k1"))
            .await;
        assert!(matches!(result, Err(CoreError::InvalidData(_))));

        let result = service
            .create_order(
                UserId::new(),
                vec![LineItem::new("U1", 0)],
                IdempotencyKey::new("k2"),
            )
            .await;
        assert!(matches!(result, Err(CoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn update_items_requires_pending() {
        let (service, _) = setup();
        let order = service
            .create_order(UserId::new(), items(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        let updated = service
            .update_items(order.id(), vec![LineItem::new("U2", 1)])
            .await
            .unwrap();
        assert_eq!(updated.items()[0].catalog_id.as_str(), "U2");

        service.cancel_order(order.id()).await.unwrap();
        let result = service.update_items(order.id(), items()).await;
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn cancel_twice_is_idempotent() {
        let (service, _) = setup();
        let order = service
            .create_order(UserId::new(), items(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        let first = service.cancel_order(order.id()).await.unwrap();
        assert_eq!(first.status(), OrderStatus::UserCanceled);
        let first_version = first.version();

        let second = service.cancel_order(order.id()).await.unwrap();
        assert_eq!(second.status(), OrderStatus::UserCanceled);
        assert_eq!(second.version(), first_version);
    }

    #[tokio::test]
    async fn cancel_paid_order_is_invalid_state() {
        let (service, _) = setup();
        let order = service
            .create_order(UserId::new(), items(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        service
            .apply_payment_status(PaymentStatusEvent {
                order_id: order.id(),
                status: OrderStatus::Paid,
                reason: PaymentStatus::Successful,
            })
            .await
            .unwrap();

        let result = service.cancel_order(order.id()).await;
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn payment_status_for_unknown_order_is_not_found() {
        let (service, _) = setup();
        let result = service
            .apply_payment_status(PaymentStatusEvent {
                order_id: OrderId::new(),
                status: OrderStatus::Paid,
                reason: PaymentStatus::Successful,
            })
            .await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn late_outcome_does_not_clobber_cancellation() {
        let (service, _) = setup();
        let order = service
            .create_order(UserId::new(), items(), IdempotencyKey::new("k1"))
            .await
            .unwrap();
        service.cancel_order(order.id()).await.unwrap();

        service
            .apply_payment_status(PaymentStatusEvent {
                order_id: order.id(),
                status: OrderStatus::Paid,
                reason: PaymentStatus::Successful,
            })
            .await
            .unwrap();

        assert_eq!(
            service.get_order(order.id()).unwrap().status(),
            OrderStatus::UserCanceled
        );
    }

    #[tokio::test]
    async fn failed_then_successful_payment_reaches_paid() {
        let (service, _) = setup();
        let order = service
            .create_order(UserId::new(), items(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        service
            .apply_payment_status(PaymentStatusEvent {
                order_id: order.id(),
                status: OrderStatus::PaymentFailed,
                reason: PaymentStatus::InsufficientFunds,
            })
            .await
            .unwrap();
        assert_eq!(
            service.get_order(order.id()).unwrap().status(),
            OrderStatus::PaymentFailed
        );

        service
            .apply_payment_status(PaymentStatusEvent {
                order_id: order.id(),
                status: OrderStatus::Paid,
                reason: PaymentStatus::Successful,
            })
            .await
            .unwrap();
        assert_eq!(
            service.get_order(order.id()).unwrap().status(),
            OrderStatus::Paid
        );
    }

    #[tokio::test]
    async fn delete_order_removes_it() {
        let (service, _) = setup();
        let order = service
            .create_order(UserId::new(), items(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        service.delete_order(order.id()).await.unwrap();
        assert!(matches!(
            service.get_order(order.id()),
            Err(CoreError::NotFound(_))
        ));
    }
}
