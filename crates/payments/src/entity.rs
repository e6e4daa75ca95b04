//! Payment entity and card value types.

use chrono::{DateTime, Utc};
use common::{IdempotencyKey, OrderId, PaymentId, PaymentStatus, UserId};
use serde::{Deserialize, Serialize};

/// Card data supplied at payment creation.
///
/// Expiration is `MMYY`. The full card number is held internally and
/// masked to the last four digits on every read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub card_number: String,
    pub expiration: String,
    pub cvv: String,
    pub billing_address: String,
    pub zip: String,
}

/// Partial card update; only supplied fields are validated and applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardUpdate {
    pub card_number: Option<String>,
    pub expiration: Option<String>,
    pub cvv: Option<String>,
    pub billing_address: Option<String>,
    pub zip: Option<String>,
}

/// A payment owned by the payment service.
///
/// At most one payment exists per order; the order ID is a weak
/// reference, never a live pointer into the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    user_id: UserId,
    card: CardDetails,
    status: PaymentStatus,
    idempotency_key: IdempotencyKey,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a payment with its initial outcome already drawn.
    pub fn new(
        order_id: OrderId,
        user_id: UserId,
        card: CardDetails,
        status: PaymentStatus,
        idempotency_key: IdempotencyKey,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            order_id,
            user_id,
            card,
            status,
            idempotency_key,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
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

    pub(crate) fn card(&self) -> &CardDetails {
        &self.card
    }

    /// Card number masked to the last four digits.
    pub fn masked_card(&self) -> String {
        let digits = &self.card.card_number;
        let last_four = &digits[digits.len().saturating_sub(4)..];
        format!("****{last_four}")
    }

    pub(crate) fn set_status(&mut self, status: PaymentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub(crate) fn apply_update(&mut self, update: &CardUpdate) {
        if let Some(ref card_number) = update.card_number {
            self.card.card_number = card_number.clone();
        }
        if let Some(ref expiration) = update.expiration {
            self.card.expiration = expiration.clone();
        }
        if let Some(ref cvv) = update.cvv {
            self.card.cvv = cvv.clone();
        }
        if let Some(ref billing_address) = update.billing_address {
            self.card.billing_address = billing_address.clone();
        }
        if let Some(ref zip) = update.zip {
            self.card.zip = zip.clone();
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
pub(crate) fn test_card() -> CardDetails {
    CardDetails {
        card_number: "4242424242424242".to_string(),
        expiration: "1230".to_string(),
        cvv: "123".to_string(),
        billing_address: "1 Main St".to_string(),
        zip: "02134".to_string(),
    }
}
