use async_trait::async_trait;
use common::ProductId;

use crate::{Result, StockRecord};

/// Storage abstraction for per-product stock counters.
///
/// Implementations must evaluate the condition and the write of
/// [`adjust_quantity`](Self::adjust_quantity) together, atomically. A
/// read-modify-write gap between the two is what allows overselling when
/// decrements for the same product race, so it is forbidden by contract.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Provisions a new stock record for a product.
    ///
    /// Fails with [`StockError::DuplicateEntry`](crate::StockError::DuplicateEntry)
    /// if the product already has one.
    async fn create(&self, product_id: ProductId, quantity: u32) -> Result<StockRecord>;

    /// Returns the stock record for a product.
    async fn get(&self, product_id: ProductId) -> Result<StockRecord>;

    /// Applies `delta` to the stored quantity, but only if the resulting
    /// quantity stays non-negative.
    ///
    /// When the conditional write matches zero records, a negative delta
    /// means the guard rejected the change
    /// ([`StockError::InsufficientStock`](crate::StockError::InsufficientStock));
    /// a non-negative delta means the record does not exist
    /// ([`StockError::NotFound`](crate::StockError::NotFound)). Records are
    /// never implicitly created here.
    async fn adjust_quantity(&self, product_id: ProductId, delta: i64) -> Result<()>;

    /// Returns whether at least `quantity` units are currently on hand.
    ///
    /// This is a point-in-time read and only a hint; the no-oversell
    /// guarantee lives in [`adjust_quantity`](Self::adjust_quantity).
    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> Result<bool>;
}
