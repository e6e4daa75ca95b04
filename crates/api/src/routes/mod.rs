//! HTTP route handlers.

pub mod health;
pub mod items;
pub mod metrics;
pub mod orders;
pub mod payments;

use axum::http::HeaderMap;
use common::{IdempotencyKey, UserId};

use crate::error::ApiError;

/// Extracts the authenticated user from the `X-User-Id` header.
///
/// Identity is established upstream; the header carries an opaque
/// user UUID.
pub(crate) fn user_id(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing X-User-Id header".to_string()))?;
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("invalid X-User-Id header: {e}")))?;
    Ok(UserId::from_uuid(uuid))
}

/// Extracts the client-supplied `Idempotency-Key` header.
pub(crate) fn idempotency_key(headers: &HeaderMap) -> Result<IdempotencyKey, ApiError> {
    let raw = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing Idempotency-Key header".to_string()))?;
    Ok(IdempotencyKey::new(raw))
}
