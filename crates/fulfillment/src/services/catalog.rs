//! Catalog collaborator contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, ProductId};

use super::ServiceError;

/// The slice of a catalog entry the orchestrator cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    /// Current price per unit. Resolved at validation time; callers never
    /// supply prices themselves.
    pub price: Money,
}

/// Trait for per-product price lookups against the remote catalog.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Returns the product's current catalog entry.
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ServiceError>;
}

#[derive(Debug, Default)]
struct CatalogState {
    prices: HashMap<ProductId, Money>,
    latency: Option<Duration>,
    fail_all: bool,
}

/// In-memory catalog service for testing.
///
/// Supports injectable latency so deadline behavior can be exercised with
/// the tokio test clock, and a failure switch for transport errors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogService {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalogService {
    /// Creates a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a product's price.
    pub fn set_price(&self, product_id: ProductId, price: Money) {
        self.state.write().unwrap().prices.insert(product_id, price);
    }

    /// Makes every lookup take this long before answering.
    pub fn set_latency(&self, latency: Duration) {
        self.state.write().unwrap().latency = Some(latency);
    }

    /// Makes every lookup fail with a transport error.
    pub fn set_fail_all(&self, fail: bool) {
        self.state.write().unwrap().fail_all = fail;
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalogService {
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ServiceError> {
        let (latency, fail_all, price) = {
            let state = self.state.read().unwrap();
            (
                state.latency,
                state.fail_all,
                state.prices.get(&product_id).copied(),
            )
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if fail_all {
            return Err(ServiceError::Transport("catalog unreachable".to_string()));
        }

        price
            .map(|price| Product {
                id: product_id,
                price,
            })
            .ok_or(ServiceError::ProductNotFound)
    }
}
