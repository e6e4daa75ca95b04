//! Inventory record and its invariant.

use common::{CatalogId, CoreError};
use serde::{Deserialize, Serialize};

/// One catalog entry with its live stock count.
///
/// Invariant: `purchase_limit <= stock_count` after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub catalog_id: CatalogId,
    pub name: String,
    pub price_cents: u64,
    pub stock_count: u32,
    pub purchase_limit: u32,
    pub category: String,
}

impl InventoryRecord {
    /// Checks the field and invariant rules for a full record.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidData("item name is required".to_string()));
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::InvalidData("category is required".to_string()));
        }
        if self.price_cents == 0 {
            return Err(CoreError::InvalidData("price must be positive".to_string()));
        }
        if self.purchase_limit > self.stock_count {
            return Err(CoreError::InvalidData(
                "purchase limit cannot exceed stock count".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial catalog update; only supplied fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub name: Option<String>,
    pub price_cents: Option<u64>,
    pub stock_count: Option<u32>,
    pub purchase_limit: Option<u32>,
    pub category: Option<String>,
}

impl RecordUpdate {
    /// Applies the supplied fields to a record.
    pub(crate) fn apply_to(&self, record: &mut InventoryRecord) {
        if let Some(ref name) = self.name {
            record.name = name.clone();
        }
        if let Some(price_cents) = self.price_cents {
            record.price_cents = price_cents;
        }
        if let Some(stock_count) = self.stock_count {
            record.stock_count = stock_count;
        }
        if let Some(purchase_limit) = self.purchase_limit {
            record.purchase_limit = purchase_limit;
        }
        if let Some(ref category) = self.category {
            record.category = category.clone();
        }
    }
}

#[cfg(test)]
pub(crate) fn test_record(catalog_id: &str, stock_count: u32, purchase_limit: u32) -> InventoryRecord {
    InventoryRecord {
        catalog_id: CatalogId::from(catalog_id),
        name: format!("item {catalog_id}"),
        price_cents: 1299,
        stock_count,
        purchase_limit,
        category: "general".to_string(),
    }
}
