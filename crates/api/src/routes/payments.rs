//! Payment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId};
use payments::{CardDetails, CardUpdate, Payment};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub card_number: String,
    pub expiration: String,
    pub cvv: String,
    pub billing_address: String,
    pub zip: String,
}

// -- Response types --

/// Payment as returned to clients; the card number is always masked.
#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub status: String,
    pub card_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id().to_string(),
            order_id: payment.order_id().to_string(),
            user_id: payment.user_id().to_string(),
            status: payment.status().to_string(),
            card_number: payment.masked_card(),
            created_at: payment.created_at(),
            updated_at: payment.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /payments — create the payment for an order and draw its
/// outcome. Requires `X-User-Id` and `Idempotency-Key` headers; a
/// duplicate payment or reused key returns 409, invalid card data 400.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let user_id = super::user_id(&headers)?;
    let key = super::idempotency_key(&headers)?;

    let card = CardDetails {
        card_number: req.card_number,
        expiration: req.expiration,
        cvv: req.cvv,
        billing_address: req.billing_address,
        zip: req.zip,
    };
    let payment = state
        .payments
        .create_payment(OrderId::from_uuid(req.order_id), user_id, card, key)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// GET /payments/{id} — load one payment, masked; 401 on owner mismatch.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<PaymentResponse>, ApiError> {
    let user_id = super::user_id(&headers)?;
    let payment = state
        .payments
        .get_payment(PaymentId::from_uuid(id), user_id)?;
    Ok(Json(payment.into()))
}

/// PUT /payments/{id} — update card fields and re-draw the outcome;
/// 409 when the payment is terminal, 401 on owner mismatch.
#[tracing::instrument(skip(state, headers, update))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<CardUpdate>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let user_id = super::user_id(&headers)?;
    let payment = state
        .payments
        .update_payment(PaymentId::from_uuid(id), user_id, update)
        .await?;
    Ok(Json(payment.into()))
}
