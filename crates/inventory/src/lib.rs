//! Inventory service.
//!
//! Owns the stock ledger: per-item stock counts with the
//! `purchase_limit <= stock_count` invariant, catalog management, and
//! the decrement reaction to paid orders. Stock never goes negative; a
//! decrement that would do so fails and leaves the record unchanged.

pub mod entity;
pub mod handler;
pub mod service;
pub mod store;

pub use entity::{InventoryRecord, RecordUpdate};
pub use handler::PaidOrderHandler;
pub use service::InventoryService;
pub use store::InventoryStore;
