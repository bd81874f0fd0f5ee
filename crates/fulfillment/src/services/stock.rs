//! Remote stock collaborator contract, in-memory implementation, and the
//! ledger-backed adapter.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use stock_ledger::{InventoryService, StockError, StockLedger};

use super::ServiceError;

/// Which way a stock adjustment goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    Increase,
    Decrease,
}

/// Trait for the remote inventory service's availability and adjustment API.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Returns whether at least `quantity` units are on hand right now.
    /// This is a point-in-time hint, not a reservation.
    async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, ServiceError>;

    /// Requests a stock adjustment of `quantity` units in the given direction.
    async fn adjust_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
        direction: StockDirection,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct StockState {
    on_hand: HashMap<ProductId, i64>,
    adjustments: Vec<(ProductId, i64)>,
    latency: Option<Duration>,
    fail_on_check: bool,
    fail_adjust: HashSet<ProductId>,
}

/// In-memory stock service for testing.
///
/// Records every adjustment it is asked for so tests can assert on the
/// post-commit decrement sweep.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockService {
    state: Arc<RwLock<StockState>>,
}

impl InMemoryStockService {
    /// Creates a new in-memory stock service with nothing on hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a product's on-hand quantity.
    pub fn set_quantity(&self, product_id: ProductId, quantity: i64) {
        self.state.write().unwrap().on_hand.insert(product_id, quantity);
    }

    /// Makes every availability check take this long before answering.
    pub fn set_latency(&self, latency: Duration) {
        self.state.write().unwrap().latency = Some(latency);
    }

    /// Makes every availability check fail with a transport error.
    pub fn set_fail_on_check(&self, fail: bool) {
        self.state.write().unwrap().fail_on_check = fail;
    }

    /// Makes adjustments for one product fail with a transport error.
    /// Other products keep adjusting normally.
    pub fn set_fail_on_adjust(&self, product_id: ProductId, fail: bool) {
        let mut state = self.state.write().unwrap();
        if fail {
            state.fail_adjust.insert(product_id);
        } else {
            state.fail_adjust.remove(&product_id);
        }
    }

    /// Returns the signed deltas applied so far, in request order.
    pub fn adjustments(&self) -> Vec<(ProductId, i64)> {
        self.state.read().unwrap().adjustments.clone()
    }
}

#[async_trait]
impl StockService for InMemoryStockService {
    async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, ServiceError> {
        let (latency, fail, on_hand) = {
            let state = self.state.read().unwrap();
            (
                state.latency,
                state.fail_on_check,
                state.on_hand.get(&product_id).copied(),
            )
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if fail {
            return Err(ServiceError::Transport(
                "inventory service unreachable".to_string(),
            ));
        }

        // An unknown product simply has nothing on hand.
        Ok(on_hand.unwrap_or(0) >= quantity as i64)
    }

    async fn adjust_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
        direction: StockDirection,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();

        if state.fail_adjust.contains(&product_id) {
            return Err(ServiceError::Transport(
                "inventory service unreachable".to_string(),
            ));
        }

        let delta = match direction {
            StockDirection::Increase => quantity as i64,
            StockDirection::Decrease => -(quantity as i64),
        };
        *state.on_hand.entry(product_id).or_insert(0) += delta;
        state.adjustments.push((product_id, delta));
        Ok(())
    }
}

/// Adapts an in-process [`StockLedger`] to the remote [`StockService`]
/// contract, for deployments where the inventory store is co-located.
pub struct LedgerStockService<L: StockLedger> {
    inventory: InventoryService<L>,
}

impl<L: StockLedger> LedgerStockService<L> {
    /// Creates a new adapter over the given ledger.
    pub fn new(ledger: L) -> Self {
        Self {
            inventory: InventoryService::new(ledger),
        }
    }
}

#[async_trait]
impl<L: StockLedger> StockService for LedgerStockService<L> {
    async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, ServiceError> {
        match self.inventory.check_availability(product_id, quantity).await {
            Ok(available) => Ok(available),
            // Products the ledger has never seen are simply unavailable,
            // the same answer a remote check gives for an unknown product.
            Err(StockError::NotFound(_)) => Ok(false),
            Err(err) => Err(ServiceError::Transport(err.to_string())),
        }
    }

    async fn adjust_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
        direction: StockDirection,
    ) -> Result<(), ServiceError> {
        let result = match direction {
            StockDirection::Increase => self.inventory.increment(product_id, quantity).await,
            StockDirection::Decrease => self.inventory.decrement(product_id, quantity).await,
        };
        result.map_err(|err| ServiceError::Transport(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stock_ledger::InMemoryStockLedger;

    #[tokio::test]
    async fn in_memory_check_and_adjust() {
        let stock = InMemoryStockService::new();
        let product = ProductId::new(1);
        stock.set_quantity(product, 5);

        assert!(stock.check_availability(product, 5).await.unwrap());
        assert!(!stock.check_availability(product, 6).await.unwrap());

        stock
            .adjust_stock(product, 2, StockDirection::Decrease)
            .await
            .unwrap();
        assert_eq!(stock.adjustments(), vec![(product, -2)]);
        assert!(!stock.check_availability(product, 4).await.unwrap());
    }

    #[tokio::test]
    async fn in_memory_adjust_failure_is_per_product() {
        let stock = InMemoryStockService::new();
        let broken = ProductId::new(1);
        let healthy = ProductId::new(2);
        stock.set_quantity(broken, 5);
        stock.set_quantity(healthy, 5);
        stock.set_fail_on_adjust(broken, true);

        let result = stock.adjust_stock(broken, 1, StockDirection::Decrease).await;
        assert!(matches!(result, Err(ServiceError::Transport(_))));

        stock
            .adjust_stock(healthy, 1, StockDirection::Decrease)
            .await
            .unwrap();
        assert_eq!(stock.adjustments(), vec![(healthy, -1)]);

        stock.set_fail_on_adjust(broken, false);
        stock
            .adjust_stock(broken, 1, StockDirection::Decrease)
            .await
            .unwrap();
        assert_eq!(stock.adjustments(), vec![(healthy, -1), (broken, -1)]);
    }

    #[tokio::test]
    async fn in_memory_unknown_product_is_unavailable() {
        let stock = InMemoryStockService::new();
        assert!(!stock
            .check_availability(ProductId::new(9), 1)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn ledger_adapter_round_trip() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);
        ledger.create(product, 10).await.unwrap();

        let service = LedgerStockService::new(ledger.clone());

        assert!(service.check_availability(product, 10).await.unwrap());
        service
            .adjust_stock(product, 4, StockDirection::Decrease)
            .await
            .unwrap();
        assert_eq!(ledger.get(product).await.unwrap().quantity, 6);

        service
            .adjust_stock(product, 1, StockDirection::Increase)
            .await
            .unwrap();
        assert_eq!(ledger.get(product).await.unwrap().quantity, 7);
    }

    #[tokio::test]
    async fn ledger_adapter_unknown_product_is_unavailable() {
        let service = LedgerStockService::new(InMemoryStockLedger::new());
        assert!(!service
            .check_availability(ProductId::new(9), 1)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn ledger_adapter_surfaces_rejected_decrease() {
        let ledger = InMemoryStockLedger::new();
        let product = ProductId::new(1);
        ledger.create(product, 2).await.unwrap();

        let service = LedgerStockService::new(ledger.clone());
        let result = service
            .adjust_stock(product, 3, StockDirection::Decrease)
            .await;
        assert!(matches!(result, Err(ServiceError::Transport(_))));
        assert_eq!(ledger.get(product).await.unwrap().quantity, 2);
    }
}
