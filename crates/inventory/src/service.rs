//! Inventory service operations.

use common::{CatalogId, CoreError, OrderLifecycleEvent, OrderStatus};

use crate::entity::{InventoryRecord, RecordUpdate};
use crate::store::InventoryStore;

/// Catalog management plus the stock-decrement reaction to paid orders.
pub struct InventoryService {
    store: InventoryStore,
}

impl InventoryService {
    /// Creates the service on top of its store.
    pub fn new(store: InventoryStore) -> Self {
        Self { store }
    }

    /// Creates a catalog record.
    #[tracing::instrument(skip(self, record), fields(catalog_id = %record.catalog_id))]
    pub fn create_record(&self, record: InventoryRecord) -> Result<InventoryRecord, CoreError> {
        record.validate()?;
        let record = self.store.insert(record)?;
        metrics::counter!("inventory_records_created_total").increment(1);
        tracing::info!(catalog_id = %record.catalog_id, "catalog record created");
        Ok(record)
    }

    /// Applies a partial update to a catalog record.
    ///
    /// The full record is re-validated after the supplied fields are
    /// applied, so the `purchase_limit <= stock_count` invariant holds
    /// whichever combination of fields changes.
    #[tracing::instrument(skip(self, update))]
    pub fn update_record(
        &self,
        catalog_id: &CatalogId,
        update: RecordUpdate,
    ) -> Result<InventoryRecord, CoreError> {
        self.store.update_with(catalog_id, |record| {
            update.apply_to(record);
            record.validate()
        })
    }

    /// Loads a catalog record.
    pub fn get_record(&self, catalog_id: &CatalogId) -> Result<InventoryRecord, CoreError> {
        self.store
            .get(catalog_id)
            .ok_or_else(|| CoreError::NotFound(format!("item {catalog_id} not found")))
    }

    /// Lists the catalog sorted by catalog ID.
    pub fn list_records(&self) -> Vec<InventoryRecord> {
        self.store.list()
    }

    /// Removes a catalog record.
    #[tracing::instrument(skip(self))]
    pub fn delete_record(&self, catalog_id: &CatalogId) -> Result<(), CoreError> {
        self.store.delete(catalog_id)
    }

    /// Decrements stock for each line item of a paid order.
    ///
    /// Event-driven, not a public API. Line items apply independently
    /// per record and non-transactionally across the batch: the first
    /// failure aborts the remainder and leaves earlier decrements in
    /// place, and a retried delivery re-applies them. Known gap in the
    /// current design, kept as-is.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    pub fn apply_paid_order(&self, event: &OrderLifecycleEvent) -> Result<(), CoreError> {
        if event.order_status != OrderStatus::Paid {
            return Ok(());
        }

        for item in &event.items {
            let record = self.store.decrement(&item.catalog_id, item.quantity)?;
            metrics::counter!("inventory_decrements_total").increment(1);
            tracing::info!(
                order_id = %event.order_id,
                catalog_id = %item.catalog_id,
                quantity = item.quantity,
                stock_count = record.stock_count,
                "stock decremented for paid order"
            );
        }
        Ok(())
    }
}
