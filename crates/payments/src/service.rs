//! Payment service operations.

use std::sync::Arc;

use common::{
    CoreError, IdempotencyKey, OrderId, PaymentId, PaymentStatus, PaymentStatusEvent,
    TOPIC_PAYMENT_STATUS, UserId,
};
use event_bus::{Envelope, EventChannel};

use crate::entity::{CardDetails, CardUpdate, Payment};
use crate::outcome::{DrawSource, OutcomePolicy};
use crate::store::{CancelPaymentOutcome, PaymentStore};
use crate::validate::{validate_card, validate_update};

/// Payment lifecycle: idempotent creation with a drawn settlement
/// outcome, card updates that re-draw, and cancellation propagation
/// from user-canceled orders.
pub struct PaymentService {
    store: PaymentStore,
    channel: Arc<dyn EventChannel>,
    policy: OutcomePolicy,
    draws: Arc<dyn DrawSource>,
}

impl PaymentService {
    /// Creates the service on top of its store, the event channel, the
    /// outcome table, and a draw source.
    pub fn new(
        store: PaymentStore,
        channel: Arc<dyn EventChannel>,
        policy: OutcomePolicy,
        draws: Arc<dyn DrawSource>,
    ) -> Self {
        Self {
            store,
            channel,
            policy,
            draws,
        }
    }

    /// Creates the payment for an order and draws its outcome.
    ///
    /// Card fields are validated in a fixed sequence (number, then
    /// expiration, then CVV, then ZIP) and the first failure wins. A
    /// second payment for the same order, or a reused idempotency key,
    /// fails `Conflict`; the insert is the atomic arbiter for
    /// concurrent duplicates. The drawn outcome is published on the
    /// payment-status topic keyed by the order ID.
    #[tracing::instrument(skip(self, card))]
    pub async fn create_payment(
        &self,
        order_id: OrderId,
        user_id: UserId,
        card: CardDetails,
        idempotency_key: IdempotencyKey,
    ) -> Result<Payment, CoreError> {
        if self.store.exists_for_order(order_id) {
            return Err(CoreError::Conflict(format!(
                "payment already exists for order {order_id}"
            )));
        }
        if self.store.key_used(&idempotency_key) {
            return Err(CoreError::Conflict(format!(
                "idempotency key {} already used",
                idempotency_key.as_str()
            )));
        }
        validate_card(&card)?;

        let status = self.policy.outcome_for(self.draws.draw());
        let payment = self
            .store
            .insert(Payment::new(order_id, user_id, card, status, idempotency_key))?;

        metrics::counter!("payments_created_total").increment(1);
        tracing::info!(
            payment_id = %payment.id(),
            order_id = %order_id,
            outcome = %status,
            "payment created"
        );

        self.publish_outcome(&payment).await;
        Ok(payment)
    }

    /// Applies a partial card update and re-draws the outcome.
    ///
    /// Only the owning user may update; `Successful` and `UserCanceled`
    /// payments are immutable. Only supplied fields are validated, same
    /// sequence as creation. The re-drawn outcome is published like the
    /// initial one.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_payment(
        &self,
        payment_id: PaymentId,
        user_id: UserId,
        update: CardUpdate,
    ) -> Result<Payment, CoreError> {
        let payment = self.store.update_with(payment_id, |payment| {
            if payment.user_id() != user_id {
                return Err(CoreError::Unauthorized(
                    "payment belongs to another user".to_string(),
                ));
            }
            if payment.status().is_terminal() {
                return Err(CoreError::InvalidState(format!(
                    "payment is {} and cannot be updated",
                    payment.status()
                )));
            }
            validate_update(&update)?;
            // Draw only once the update is known to be accepted, so a
            // rejected request does not consume an outcome.
            let status = self.policy.outcome_for(self.draws.draw());
            payment.apply_update(&update);
            payment.set_status(status);
            Ok(())
        })?;

        metrics::counter!("payments_updated_total").increment(1);
        tracing::info!(
            payment_id = %payment_id,
            order_id = %payment.order_id(),
            outcome = %payment.status(),
            "payment updated, outcome re-drawn"
        );

        self.publish_outcome(&payment).await;
        Ok(payment)
    }

    /// Loads a payment, enforcing ownership.
    pub fn get_payment(&self, payment_id: PaymentId, user_id: UserId) -> Result<Payment, CoreError> {
        let payment = self
            .store
            .get(payment_id)
            .ok_or_else(|| CoreError::NotFound(format!("payment {payment_id} not found")))?;
        if payment.user_id() != user_id {
            return Err(CoreError::Unauthorized(
                "payment belongs to another user".to_string(),
            ));
        }
        Ok(payment)
    }

    /// Cancels the payment for a user-canceled order.
    ///
    /// Event-driven, not a public API. Unknown orders fail `NotFound`
    /// and are discarded by the channel (the order may have been
    /// canceled before any payment existed). Redundant deliveries are
    /// no-op successes. No status event is published back: the order
    /// is already terminal.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_for_order(&self, order_id: OrderId) -> Result<(), CoreError> {
        match self.store.cancel_for_order(order_id)? {
            CancelPaymentOutcome::Canceled(payment) => {
                metrics::counter!("payments_canceled_total").increment(1);
                tracing::info!(
                    payment_id = %payment.id(),
                    order_id = %order_id,
                    "payment canceled after order cancellation"
                );
                Ok(())
            }
            CancelPaymentOutcome::AlreadyCanceled(payment) => {
                tracing::info!(
                    payment_id = %payment.id(),
                    order_id = %order_id,
                    "payment already canceled, redundant delivery"
                );
                Ok(())
            }
        }
    }

    /// Publishes the payment's outcome on the payment-status topic.
    ///
    /// A publish failure is logged, not surfaced: the payment has
    /// already committed, and the transport is at-least-once, not
    /// transactional with the store.
    async fn publish_outcome(&self, payment: &Payment) {
        let event = PaymentStatusEvent {
            order_id: payment.order_id(),
            status: payment.status().order_status(),
            reason: payment.status(),
        };

        let envelope =
            match Envelope::new(TOPIC_PAYMENT_STATUS, payment.order_id().to_string(), &event) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::error!(
                        payment_id = %payment.id(),
                        error = %e,
                        "failed to encode payment status event"
                    );
                    return;
                }
            };

        if let Err(e) = self.channel.publish(envelope).await {
            tracing::error!(
                payment_id = %payment.id(),
                error = %e,
                "failed to publish payment status event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_card;
    use crate::outcome::FixedDraws;
    use event_bus::{EventHandler, InMemoryEventBus, RetryPolicy};
    use std::sync::Mutex;

    struct Recorder {
        events: Mutex<Vec<PaymentStatusEvent>>,
    }

    #[async_trait::async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn handle(&self, envelope: &Envelope) -> Result<(), CoreError> {
            let event: PaymentStatusEvent = envelope.decode()?;
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    async fn service_with_draws(draws: &[f64]) -> (PaymentService, InMemoryEventBus, Arc<Recorder>) {
        let bus = InMemoryEventBus::new(2, RetryPolicy::fast());
        let recorder = Arc::new(Recorder {
            events: Mutex::new(Vec::new()),
        });
        bus.subscribe(TOPIC_PAYMENT_STATUS, recorder.clone()).await;

        let service = PaymentService::new(
            PaymentStore::new(),
            Arc::new(bus.clone()),
            OutcomePolicy::default(),
            Arc::new(FixedDraws::new(draws.iter().copied())),
        );
        (service, bus, recorder)
    }

    #[tokio::test]
    async fn create_draws_outcome_and_publishes_it() {
        // 0.1 falls in the Successful bucket of the default table.
        let (service, bus, recorder) = service_with_draws(&[0.1]).await;
        let order_id = OrderId::new();

        let payment = service
            .create_payment(order_id, UserId::new(), test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::Successful);

        bus.flush().await;
        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].order_id, order_id);
        assert_eq!(events[0].reason, PaymentStatus::Successful);
    }

    #[tokio::test]
    async fn invalid_card_is_rejected_before_any_draw() {
        let (service, _bus, _recorder) = service_with_draws(&[0.1]).await;
        let mut card = test_card();
        card.card_number = "not-a-card".to_string();

        let result = service
            .create_payment(OrderId::new(), UserId::new(), card, IdempotencyKey::new("k1"))
            .await;
        assert!(matches!(result, Err(CoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn second_payment_for_order_conflicts() {
        let (service, _bus, _recorder) = service_with_draws(&[0.1]).await;
        let order_id = OrderId::new();
        service
            .create_payment(order_id, UserId::new(), test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        let result = service
            .create_payment(order_id, UserId::new(), test_card(), IdempotencyKey::new("k2"))
            .await;
        assert!(matches!(result, Err(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn reused_key_conflicts_even_with_an_invalid_card() {
        // The duplicate-key check runs before card validation, so a
        // replayed key reports Conflict rather than InvalidData.
        let (service, _bus, _recorder) = service_with_draws(&[0.1]).await;
        service
            .create_payment(OrderId::new(), UserId::new(), test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        let mut card = test_card();
        card.card_number = "not-a-card".to_string();
        let result = service
            .create_payment(OrderId::new(), UserId::new(), card, IdempotencyKey::new("k1"))
            .await;
        assert!(matches!(result, Err(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_redraws_outcome_and_publishes_again() {
        // First draw: InsufficientFunds; second draw: Successful.
        let (service, bus, recorder) = service_with_draws(&[0.5, 0.1]).await;
        let user_id = UserId::new();
        let payment = service
            .create_payment(OrderId::new(), user_id, test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::InsufficientFunds);

        let updated = service
            .update_payment(
                payment.id(),
                user_id,
                CardUpdate {
                    cvv: Some("999".to_string()),
                    ..CardUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status(), PaymentStatus::Successful);

        bus.flush().await;
        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].reason, PaymentStatus::Successful);
    }

    #[tokio::test]
    async fn update_by_wrong_user_is_unauthorized() {
        let (service, _bus, _recorder) = service_with_draws(&[0.5]).await;
        let payment = service
            .create_payment(OrderId::new(), UserId::new(), test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        let result = service
            .update_payment(payment.id(), UserId::new(), CardUpdate::default())
            .await;
        assert!(matches!(result, Err(CoreError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn rejected_update_does_not_consume_a_draw() {
        // 0.5: InsufficientFunds on create; 0.1: Successful for the
        // first accepted update; 0.9 would mean a rejected attempt
        // burned a draw out of turn.
        let (service, _bus, _recorder) = service_with_draws(&[0.5, 0.1, 0.9]).await;
        let user_id = UserId::new();
        let payment = service
            .create_payment(OrderId::new(), user_id, test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::InsufficientFunds);

        let denied = service
            .update_payment(payment.id(), UserId::new(), CardUpdate::default())
            .await;
        assert!(matches!(denied, Err(CoreError::Unauthorized(_))));

        let updated = service
            .update_payment(payment.id(), user_id, CardUpdate::default())
            .await
            .unwrap();
        assert_eq!(updated.status(), PaymentStatus::Successful);
    }

    #[tokio::test]
    async fn successful_payment_rejects_updates() {
        let (service, _bus, _recorder) = service_with_draws(&[0.1]).await;
        let user_id = UserId::new();
        let payment = service
            .create_payment(OrderId::new(), user_id, test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        let result = service
            .update_payment(payment.id(), user_id, CardUpdate::default())
            .await;
        assert!(matches!(result, Err(CoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn invalid_update_field_persists_nothing() {
        let (service, _bus, _recorder) = service_with_draws(&[0.5, 0.1]).await;
        let user_id = UserId::new();
        let payment = service
            .create_payment(OrderId::new(), user_id, test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        let result = service
            .update_payment(
                payment.id(),
                user_id,
                CardUpdate {
                    cvv: Some("12".to_string()),
                    ..CardUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CoreError::InvalidData(_))));
        assert_eq!(
            service.get_payment(payment.id(), user_id).unwrap().status(),
            PaymentStatus::InsufficientFunds
        );
    }

    #[tokio::test]
    async fn cancel_for_order_is_idempotent_and_silent() {
        let (service, bus, recorder) = service_with_draws(&[0.5]).await;
        let order_id = OrderId::new();
        service
            .create_payment(order_id, UserId::new(), test_card(), IdempotencyKey::new("k1"))
            .await
            .unwrap();

        service.cancel_for_order(order_id).await.unwrap();
        service.cancel_for_order(order_id).await.unwrap();

        bus.flush().await;
        // Only the creation outcome is on the wire; cancellation does
        // not publish back.
        assert_eq!(recorder.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_for_unknown_order_is_not_found() {
        let (service, _bus, _recorder) = service_with_draws(&[0.5]).await;
        let result = service.cancel_for_order(OrderId::new()).await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }
}
