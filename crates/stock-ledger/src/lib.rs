//! Stock ledger for the orderflow system.
//!
//! Holds one quantity counter per product and exposes an atomic conditional
//! adjustment that can never drive a counter negative, even under racing
//! decrements. The guarantee lives entirely in the storage layer's
//! conditional write; no in-process locking is layered on top of the
//! PostgreSQL implementation.

mod error;
mod ledger;
mod memory;
mod model;
mod postgres;
mod service;

pub use error::{Result, StockError};
pub use ledger::StockLedger;
pub use memory::InMemoryStockLedger;
pub use model::StockRecord;
pub use postgres::PostgresStockLedger;
pub use service::InventoryService;
