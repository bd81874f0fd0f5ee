//! The order-creation orchestrator.

use std::sync::Arc;
use std::time::Duration;

use common::{Money, OrderId, Page, UserId};
use order_store::{Address, DraftItem, Order, OrderDraft, OrderStatus, OrderStore};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::error::{FulfillmentError, ItemFailure, Result};
use crate::services::{AuthService, CartService, CatalogService, StockDirection, StockService};
use crate::validator::{LineItem, ValidatedItem, validate_item};

/// An incoming order request.
///
/// Items carry product id and quantity only; prices are resolved at
/// validation time. When the order is sourced from the cart, the items here
/// are ignored and the shipping address is still taken from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub shipping_address: Address,
    pub items: Vec<LineItem>,
}

/// Drives the end-to-end order workflow.
///
/// `create_order` authenticates, sources items, fans validation out across
/// one task per item under a shared deadline, persists the order atomically,
/// and then fires the best-effort post-commit effects. Read and status
/// operations are authenticated pass-throughs to the store: listing is
/// scoped to the resolved identity, while point reads and status updates
/// rely on whatever the store's predicates enforce.
pub struct OrderOrchestrator<A, C, S, K, R> {
    auth: Arc<A>,
    catalog: Arc<C>,
    stock: Arc<S>,
    cart: Arc<K>,
    store: Arc<R>,
}

impl<A, C, S, K, R> OrderOrchestrator<A, C, S, K, R>
where
    A: AuthService,
    C: CatalogService + 'static,
    S: StockService + 'static,
    K: CartService,
    R: OrderStore,
{
    /// Creates a new orchestrator over the given collaborators and store.
    pub fn new(auth: A, catalog: C, stock: S, cart: K, store: R) -> Self {
        Self {
            auth: Arc::new(auth),
            catalog: Arc::new(catalog),
            stock: Arc::new(stock),
            cart: Arc::new(cart),
            store: Arc::new(store),
        }
    }

    /// Creates an order for the caller identified by `auth_token`.
    ///
    /// With `from_cart`, the request's items are discarded and the user's
    /// pending cart lines are ordered instead. Validation is all-or-nothing:
    /// any failing item fails the call with every failure enumerated, and no
    /// order is persisted. Once the order commits, stock decrements and cart
    /// clearing are attempted but can no longer fail the call.
    #[tracing::instrument(skip(self, auth_token, request))]
    pub async fn create_order(
        &self,
        auth_token: &str,
        request: OrderRequest,
        from_cart: bool,
    ) -> Result<Order> {
        let user_id = self.resolve_identity(auth_token).await?;

        let items: Vec<LineItem> = if from_cart {
            let lines = self.cart.get_cart(auth_token).await?;
            if lines.is_empty() {
                return Err(FulfillmentError::EmptyCart);
            }
            lines
                .into_iter()
                .map(|line| LineItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect()
        } else {
            request.items
        };

        let validation_start = std::time::Instant::now();
        let validated = self.validate_items(&items).await?;
        metrics::histogram!("order_validation_seconds")
            .record(validation_start.elapsed().as_secs_f64());

        let total_price: Money = validated
            .iter()
            .map(|item| item.unit_price.multiply(item.quantity))
            .sum();
        let draft_items = validated
            .iter()
            .map(|item| DraftItem {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        let draft = OrderDraft::pending(user_id, total_price, request.shipping_address, draft_items);
        let order = self.store.create(draft).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = %order.total_price,
            item_count = order.items.len(),
            "order created"
        );

        // The order is committed; everything from here is best-effort and
        // is awaited only so failures can be logged before returning.
        self.decrement_stock(&order).await;

        if from_cart {
            if let Err(err) = self.cart.clear_cart(auth_token).await {
                metrics::counter!("cart_clear_failures_total").increment(1);
                tracing::warn!(order_id = %order.id, error = %err, "cart clearance failed");
            }
        }

        Ok(order)
    }

    /// Returns an order by id.
    #[tracing::instrument(skip(self, auth_token))]
    pub async fn get_order(&self, auth_token: &str, order_id: OrderId) -> Result<Order> {
        self.resolve_identity(auth_token).await?;
        Ok(self.store.get_by_id(order_id).await?)
    }

    /// Returns a page of the caller's orders, newest first.
    #[tracing::instrument(skip(self, auth_token))]
    pub async fn list_user_orders(
        &self,
        auth_token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Order>> {
        let user_id = self.resolve_identity(auth_token).await?;

        let total = self.store.count_by_user(user_id).await?;
        let items = self.store.list_by_user(user_id, limit, offset).await?;

        Ok(Page {
            items,
            limit,
            offset,
            total,
        })
    }

    /// Overwrites an order's status.
    #[tracing::instrument(skip(self, auth_token))]
    pub async fn update_order_status(
        &self,
        auth_token: &str,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<()> {
        self.resolve_identity(auth_token).await?;
        Ok(self.store.update_status(order_id, status).await?)
    }

    async fn resolve_identity(&self, auth_token: &str) -> Result<UserId> {
        self.auth.validate_token(auth_token).await.map_err(|err| {
            tracing::warn!(error = %err, "token validation failed");
            FulfillmentError::Unauthorized
        })
    }

    /// Validates all items concurrently under one shared deadline.
    ///
    /// Each item gets its own task; outcomes land in the slot owned by the
    /// item's original position, and failures are gathered by this single
    /// draining task. Deadline expiry aborts every in-flight validation and
    /// fails the whole call.
    async fn validate_items(&self, items: &[LineItem]) -> Result<Vec<ValidatedItem>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let budget = validation_budget(items.len());

        let mut tasks = JoinSet::new();
        for (index, item) in items.iter().copied().enumerate() {
            let catalog = Arc::clone(&self.catalog);
            let stock = Arc::clone(&self.stock);
            tasks.spawn(async move { (index, validate_item(&*catalog, &*stock, &item).await) });
        }

        let mut slots: Vec<Option<ValidatedItem>> = vec![None; items.len()];
        let mut failures: Vec<ItemFailure> = Vec::new();

        let drain = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, Ok(valid))) => slots[index] = Some(valid),
                    Ok((_, Err(failure))) => failures.push(failure),
                    Err(err) => failures.push(ItemFailure::Task(err.to_string())),
                }
            }
        };

        let timed_out = tokio::time::timeout(budget, drain).await.is_err();
        if timed_out {
            tasks.abort_all();
            metrics::counter!("order_validation_timeouts_total").increment(1);
            tracing::warn!(?budget, item_count = items.len(), "validation deadline hit");
            return Err(FulfillmentError::ValidationTimeout(budget));
        }

        if !failures.is_empty() {
            return Err(FulfillmentError::ValidationFailed(failures));
        }

        let validated: Vec<ValidatedItem> = slots.into_iter().flatten().collect();
        debug_assert_eq!(validated.len(), items.len());
        Ok(validated)
    }

    /// Requests a stock decrement for every item on a committed order.
    ///
    /// Decrements run concurrently and are awaited as a group; individual
    /// failures are logged and counted but never surfaced.
    async fn decrement_stock(&self, order: &Order) {
        let outcomes =
            futures_util::future::join_all(order.items.iter().map(|item| async move {
                let result = self
                    .stock
                    .adjust_stock(item.product_id, item.quantity, StockDirection::Decrease)
                    .await;
                (item.product_id, item.quantity, result)
            }))
            .await;

        for (product_id, quantity, result) in outcomes {
            if let Err(err) = result {
                metrics::counter!("stock_decrement_failures_total").increment(1);
                tracing::warn!(
                    order_id = %order.id,
                    %product_id,
                    quantity,
                    error = %err,
                    "stock decrement failed"
                );
            }
        }
    }
}

/// Validation budget: 30 seconds per item, capped at 150 seconds.
fn validation_budget(item_count: usize) -> Duration {
    const PER_ITEM_SECS: u64 = 30;
    const CAP_SECS: u64 = 150;
    Duration::from_secs((PER_ITEM_SECS * item_count as u64).min(CAP_SECS))
}
