use common::ProductId;
use serde::{Deserialize, Serialize};

/// One stock counter row.
///
/// Created once per product by the provisioning path and mutated only
/// through [`StockLedger::adjust_quantity`](crate::StockLedger::adjust_quantity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Row identifier assigned by the store.
    pub id: i64,
    /// The product this counter belongs to. Unique per record.
    pub product_id: ProductId,
    /// Units on hand. Never negative.
    pub quantity: i64,
}
