//! Inventory service providing a simplified API over the stock ledger.

use common::ProductId;

use crate::{Result, StockLedger, StockRecord};

/// Service for managing per-product inventory.
///
/// Wraps a [`StockLedger`] and exposes the increment/decrement operations
/// the rest of the system uses. All mutation funnels through the ledger's
/// atomic conditional adjustment.
pub struct InventoryService<L: StockLedger> {
    ledger: L,
}

impl<L: StockLedger> InventoryService<L> {
    /// Creates a new inventory service backed by the given ledger.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Returns a reference to the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Provisions a stock record for a newly created product.
    #[tracing::instrument(skip(self))]
    pub async fn provision(&self, product_id: ProductId, quantity: u32) -> Result<StockRecord> {
        let record = self.ledger.create(product_id, quantity).await?;
        tracing::info!(%product_id, quantity, "stock record provisioned");
        Ok(record)
    }

    /// Returns the stock record for a product.
    pub async fn get(&self, product_id: ProductId) -> Result<StockRecord> {
        self.ledger.get(product_id).await
    }

    /// Returns whether at least `quantity` units are on hand right now.
    pub async fn check_availability(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        self.ledger.check_availability(product_id, quantity).await
    }

    /// Adds `quantity` units to the product's stock.
    #[tracing::instrument(skip(self))]
    pub async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        self.ledger
            .adjust_quantity(product_id, quantity as i64)
            .await
    }

    /// Removes `quantity` units from the product's stock.
    ///
    /// Fails with [`StockError::InsufficientStock`](crate::StockError::InsufficientStock)
    /// if fewer than `quantity` units are on hand.
    #[tracing::instrument(skip(self))]
    pub async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        self.ledger
            .adjust_quantity(product_id, -(quantity as i64))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryStockLedger, StockError};

    #[tokio::test]
    async fn provision_and_get() {
        let service = InventoryService::new(InMemoryStockLedger::new());
        let product = ProductId::new(1);

        service.provision(product, 20).await.unwrap();
        assert_eq!(service.get(product).await.unwrap().quantity, 20);
    }

    #[tokio::test]
    async fn increment_then_decrement() {
        let service = InventoryService::new(InMemoryStockLedger::new());
        let product = ProductId::new(1);
        service.provision(product, 5).await.unwrap();

        service.increment(product, 10).await.unwrap();
        service.decrement(product, 12).await.unwrap();
        assert_eq!(service.get(product).await.unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn decrement_below_zero_rejected() {
        let service = InventoryService::new(InMemoryStockLedger::new());
        let product = ProductId::new(1);
        service.provision(product, 2).await.unwrap();

        let result = service.decrement(product, 3).await;
        assert!(matches!(result, Err(StockError::InsufficientStock(_))));
        assert_eq!(service.get(product).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn availability_reflects_stock() {
        let service = InventoryService::new(InMemoryStockLedger::new());
        let product = ProductId::new(1);
        service.provision(product, 4).await.unwrap();

        assert!(service.check_availability(product, 4).await.unwrap());
        assert!(!service.check_availability(product, 5).await.unwrap());
    }
}
