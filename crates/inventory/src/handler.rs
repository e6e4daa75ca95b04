//! Event-channel consumer for paid orders.

use std::sync::Arc;

use async_trait::async_trait;
use common::{CoreError, OrderLifecycleEvent};
use event_bus::{Envelope, EventHandler};

use crate::service::InventoryService;

/// Subscribes the inventory service to the order-lifecycle topic.
///
/// The service itself filters on `Paid`; every other transition is
/// acknowledged untouched.
pub struct PaidOrderHandler {
    service: Arc<InventoryService>,
}

impl PaidOrderHandler {
    pub fn new(service: Arc<InventoryService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for PaidOrderHandler {
    fn name(&self) -> &'static str {
        "inventory-ledger"
    }

    async fn handle(&self, envelope: &Envelope) -> Result<(), CoreError> {
        let event: OrderLifecycleEvent = envelope.decode()?;
        self.service.apply_paid_order(&event)
    }
}
