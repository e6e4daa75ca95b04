//! Event-channel consumer for order lifecycle transitions.

use std::sync::Arc;

use async_trait::async_trait;
use common::{CoreError, OrderLifecycleEvent, OrderStatus};
use event_bus::{Envelope, EventHandler};

use crate::service::PaymentService;

/// Subscribes the payment service to the order-lifecycle topic.
///
/// Only `UserCanceled` transitions are acted on; creation and paid
/// fan-out events concern other consumers and are acknowledged as-is.
pub struct OrderLifecycleHandler {
    service: Arc<PaymentService>,
}

impl OrderLifecycleHandler {
    pub fn new(service: Arc<PaymentService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for OrderLifecycleHandler {
    fn name(&self) -> &'static str {
        "payment-cancellation"
    }

    async fn handle(&self, envelope: &Envelope) -> Result<(), CoreError> {
        let event: OrderLifecycleEvent = envelope.decode()?;
        if event.order_status != OrderStatus::UserCanceled {
            return Ok(());
        }
        self.service.cancel_for_order(event.order_id).await
    }
}
