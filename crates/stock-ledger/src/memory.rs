use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::ProductId;

use crate::{Result, StockError, StockLedger, StockRecord};

#[derive(Debug, Default)]
struct State {
    records: HashMap<ProductId, StockRecord>,
    next_id: i64,
}

/// In-memory stock ledger for testing.
///
/// Reproduces the PostgreSQL implementation's conditional-write semantics
/// exactly: the quantity check and the mutation happen under one lock, and a
/// missing record with a negative delta reports insufficient stock, the same
/// way a guarded `UPDATE` that matches zero rows does.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockLedger {
    state: Arc<Mutex<State>>,
}

impl InMemoryStockLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stock records.
    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn create(&self, product_id: ProductId, quantity: u32) -> Result<StockRecord> {
        let mut state = self.state.lock().unwrap();
        if state.records.contains_key(&product_id) {
            return Err(StockError::DuplicateEntry(product_id));
        }

        state.next_id += 1;
        let record = StockRecord {
            id: state.next_id,
            product_id,
            quantity: quantity as i64,
        };
        state.records.insert(product_id, record);
        Ok(record)
    }

    async fn get(&self, product_id: ProductId) -> Result<StockRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(&product_id)
            .copied()
            .ok_or(StockError::NotFound(product_id))
    }

    async fn adjust_quantity(&self, product_id: ProductId, delta: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.records.get_mut(&product_id) {
            Some(record) if record.quantity + delta >= 0 => {
                record.quantity += delta;
                Ok(())
            }
            // Matches the guarded UPDATE: a rejected decrease and a missing
            // record are indistinguishable, so the delta sign decides.
            _ if delta < 0 => Err(StockError::InsufficientStock(product_id)),
            _ => Err(StockError::NotFound(product_id)),
        }
    }

    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        let state = self.state.lock().unwrap();
        let record = state
            .records
            .get(&product_id)
            .ok_or(StockError::NotFound(product_id))?;
        Ok(record.quantity >= quantity as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);

        let record = ledger.create(product, 10).await.unwrap();
        assert_eq!(record.product_id, product);
        assert_eq!(record.quantity, 10);

        let fetched = ledger.get(product).await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn create_duplicate_rejected() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);

        ledger.create(product, 10).await.unwrap();
        let result = ledger.create(product, 5).await;
        assert!(matches!(result, Err(StockError::DuplicateEntry(p)) if p == product));
    }

    #[tokio::test]
    async fn get_missing_record() {
        let ledger = InMemoryStockLedger::new();
        let result = ledger.get(ProductId::new(99)).await;
        assert!(matches!(result, Err(StockError::NotFound(_))));
    }

    #[tokio::test]
    async fn adjust_increments_and_decrements() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);
        ledger.create(product, 10).await.unwrap();

        ledger.adjust_quantity(product, 5).await.unwrap();
        assert_eq!(ledger.get(product).await.unwrap().quantity, 15);

        ledger.adjust_quantity(product, -15).await.unwrap();
        assert_eq!(ledger.get(product).await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn adjust_rejects_oversell() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);
        ledger.create(product, 3).await.unwrap();

        let result = ledger.adjust_quantity(product, -4).await;
        assert!(matches!(result, Err(StockError::InsufficientStock(_))));
        assert_eq!(ledger.get(product).await.unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn adjust_missing_record_negative_delta_is_insufficient() {
        let ledger = InMemoryStockLedger::new();
        let result = ledger.adjust_quantity(ProductId::new(99), -1).await;
        assert!(matches!(result, Err(StockError::InsufficientStock(_))));
    }

    #[tokio::test]
    async fn adjust_missing_record_positive_delta_is_not_found() {
        let ledger = InMemoryStockLedger::new();
        let result = ledger.adjust_quantity(ProductId::new(99), 1).await;
        assert!(matches!(result, Err(StockError::NotFound(_))));
    }

    #[tokio::test]
    async fn check_availability_is_a_pure_read() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);
        ledger.create(product, 5).await.unwrap();

        for _ in 0..3 {
            assert!(ledger.check_availability(product, 5).await.unwrap());
            assert!(!ledger.check_availability(product, 6).await.unwrap());
        }
        assert_eq!(ledger.get(product).await.unwrap().quantity, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decrements_never_oversell() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);
        ledger.create(product, 5).await.unwrap();

        // Two racing decrement-by-4 requests: exactly one can be satisfied.
        let l1 = ledger.clone();
        let l2 = ledger.clone();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { l1.adjust_quantity(product, -4).await }),
            tokio::spawn(async move { l2.adjust_quantity(product, -4).await }),
        );
        let outcomes = [r1.unwrap(), r2.unwrap()];

        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert_eq!(ledger.get(product).await.unwrap().quantity, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_decrement_storm_exact_success_count() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);
        ledger.create(product, 10).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.adjust_quantity(product, -1).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 10);
        assert_eq!(ledger.get(product).await.unwrap().quantity, 0);
    }
}
