//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CatalogId;
use inventory::{InventoryRecord, RecordUpdate};

use crate::AppState;
use crate::error::ApiError;

/// GET /items — list the catalog sorted by catalog ID.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<InventoryRecord>> {
    Json(state.inventory.list_records())
}

/// GET /items/{catalogId} — load one catalog record.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(catalog_id): Path<String>,
) -> Result<Json<InventoryRecord>, ApiError> {
    let record = state.inventory.get_record(&CatalogId::new(catalog_id))?;
    Ok(Json(record))
}

/// POST /items — create a catalog record; 409 on a duplicate catalog ID.
#[tracing::instrument(skip(state, record), fields(catalog_id = %record.catalog_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(record): Json<InventoryRecord>,
) -> Result<(StatusCode, Json<InventoryRecord>), ApiError> {
    let record = state.inventory.create_record(record)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /items/{catalogId} — partial update; the stock/limit invariant
/// is re-checked against the combined result.
#[tracing::instrument(skip(state, update))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(catalog_id): Path<String>,
    Json(update): Json<RecordUpdate>,
) -> Result<Json<InventoryRecord>, ApiError> {
    let record = state
        .inventory
        .update_record(&CatalogId::new(catalog_id), update)?;
    Ok(Json(record))
}

/// DELETE /items/{catalogId} — remove a catalog record.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(catalog_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.inventory.delete_record(&CatalogId::new(catalog_id))?;
    Ok(StatusCode::NO_CONTENT)
}
