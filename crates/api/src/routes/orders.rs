//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{LineItem, OrderId};
use orders::Order;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct OrderItemsRequest {
    pub items: Vec<LineItem>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            status: order.status().to_string(),
            items: order.items().to_vec(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders — create a new order. Requires `X-User-Id` and
/// `Idempotency-Key` headers; a reused key returns 409.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<OrderItemsRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id = super::user_id(&headers)?;
    let key = super::idempotency_key(&headers)?;

    let order = state.orders.create_order(user_id, req.items, key).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders — list the requesting user's orders, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user_id = super::user_id(&headers)?;
    let orders = state
        .orders
        .list_orders_for_user(user_id)
        .into_iter()
        .map(OrderResponse::from)
        .collect();
    Ok(Json(orders))
}

/// GET /orders/{id} — load one order.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order(OrderId::from_uuid(id))?;
    Ok(Json(order.into()))
}

/// PUT /orders/{id}/items — replace the item list; 409 unless Pending.
#[tracing::instrument(skip(state, req))]
pub async fn update_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<OrderItemsRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .update_items(OrderId::from_uuid(id), req.items)
        .await?;
    Ok(Json(order.into()))
}

/// PUT /orders/{id}/cancel — cancel the order; 409 if not cancelable.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.cancel_order(OrderId::from_uuid(id)).await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/{id} — administrative delete.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.orders.delete_order(OrderId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
