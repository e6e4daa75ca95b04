//! In-memory inventory store.
//!
//! Each record's read-modify-write is one atomic step under the store
//! lock; different catalog IDs in one order are still applied without
//! a cross-record transaction.

use std::collections::HashMap;
use std::sync::RwLock;

use common::{CatalogId, CoreError};

use crate::entity::InventoryRecord;

/// Thread-safe catalog storage keyed by catalog ID.
#[derive(Default)]
pub struct InventoryStore {
    records: RwLock<HashMap<CatalogId, InventoryRecord>>,
}

impl InventoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new record; the catalog ID must be unused.
    pub fn insert(&self, record: InventoryRecord) -> Result<InventoryRecord, CoreError> {
        let mut records = self.records.write().unwrap();
        if records.contains_key(&record.catalog_id) {
            return Err(CoreError::Conflict(format!(
                "item {} already exists",
                record.catalog_id
            )));
        }
        records.insert(record.catalog_id.clone(), record.clone());
        Ok(record)
    }

    /// Looks up a record by catalog ID.
    pub fn get(&self, catalog_id: &CatalogId) -> Option<InventoryRecord> {
        self.records.read().unwrap().get(catalog_id).cloned()
    }

    /// Lists all records sorted by catalog ID.
    pub fn list(&self) -> Vec<InventoryRecord> {
        let mut records: Vec<_> = self.records.read().unwrap().values().cloned().collect();
        records.sort_by(|a, b| a.catalog_id.cmp(&b.catalog_id));
        records
    }

    /// Runs an atomic read-modify-write on one record.
    ///
    /// The closure sees the record under the write lock; if it fails,
    /// nothing is persisted.
    pub fn update_with(
        &self,
        catalog_id: &CatalogId,
        mutate: impl FnOnce(&mut InventoryRecord) -> Result<(), CoreError>,
    ) -> Result<InventoryRecord, CoreError> {
        let mut records = self.records.write().unwrap();
        let record = records
            .get_mut(catalog_id)
            .ok_or_else(|| CoreError::NotFound(format!("item {catalog_id} not found")))?;

        let mut staged = record.clone();
        mutate(&mut staged)?;
        *record = staged.clone();
        Ok(staged)
    }

    /// Decrements one record's stock by `quantity`.
    ///
    /// Fails `InvalidData` without touching the record when the stock
    /// would go negative; otherwise persists the new count and clamps
    /// `purchase_limit` down to it when needed.
    pub fn decrement(
        &self,
        catalog_id: &CatalogId,
        quantity: u32,
    ) -> Result<InventoryRecord, CoreError> {
        self.update_with(catalog_id, |record| {
            let new_stock = record.stock_count.checked_sub(quantity).ok_or_else(|| {
                CoreError::InvalidData(format!(
                    "stock for item {catalog_id} cannot go negative"
                ))
            })?;

            record.stock_count = new_stock;
            if record.purchase_limit > new_stock {
                record.purchase_limit = new_stock;
            }
            Ok(())
        })
    }

    /// Removes a record.
    pub fn delete(&self, catalog_id: &CatalogId) -> Result<(), CoreError> {
        let mut records = self.records.write().unwrap();
        records
            .remove(catalog_id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("item {catalog_id} not found")))
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}
