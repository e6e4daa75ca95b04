//! Event-channel consumer for payment outcomes.

use std::sync::Arc;

use async_trait::async_trait;
use common::{CoreError, PaymentStatusEvent};
use event_bus::{Envelope, EventHandler};

use crate::service::OrderService;

/// Subscribes the order saga to the payment-status topic.
pub struct PaymentStatusHandler {
    service: Arc<OrderService>,
}

impl PaymentStatusHandler {
    pub fn new(service: Arc<OrderService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for PaymentStatusHandler {
    fn name(&self) -> &'static str {
        "order-saga"
    }

    async fn handle(&self, envelope: &Envelope) -> Result<(), CoreError> {
        let event: PaymentStatusEvent = envelope.decode()?;
        self.service.apply_payment_status(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{
        IdempotencyKey, LineItem, OrderStatus, PaymentStatus, TOPIC_PAYMENT_STATUS, UserId,
    };
    use event_bus::{EventChannel, InMemoryEventBus, RetryPolicy};

    use crate::store::OrderStore;

    #[tokio::test]
    async fn payment_status_event_drives_order_status() {
        let bus = InMemoryEventBus::new(2, RetryPolicy::fast());
        let service = Arc::new(OrderService::new(OrderStore::new(), Arc::new(bus.clone())));
        bus.subscribe(
            TOPIC_PAYMENT_STATUS,
            Arc::new(PaymentStatusHandler::new(service.clone())),
        )
        .await;

        let order = service
            .create_order(
                UserId::new(),
                vec![LineItem::new("U1", 1)],
                IdempotencyKey::new("k1"),
            )
            .await
            .unwrap();

        let event = PaymentStatusEvent {
            order_id: order.id(),
            status: OrderStatus::RepayNeeded,
            reason: PaymentStatus::ChargebackInitiated,
        };
        bus.publish(Envelope::new(TOPIC_PAYMENT_STATUS, order.id().to_string(), &event).unwrap())
            .await
            .unwrap();
        bus.flush().await;

        assert_eq!(
            service.get_order(order.id()).unwrap().status(),
            OrderStatus::RepayNeeded
        );
    }
}
