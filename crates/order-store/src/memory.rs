use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, UserId};
use tokio::sync::RwLock;

use crate::{Order, OrderDraft, OrderItem, OrderStatus, OrderStore, Result, StoreError};

#[derive(Debug, Default)]
struct State {
    orders: Vec<Order>,
    next_order_id: i64,
    next_item_id: i64,
}

/// In-memory order store for testing.
///
/// Provides the same interface and atomicity guarantees as the PostgreSQL
/// implementation: an order and its items become visible together or not
/// at all.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the total number of stored order item rows.
    pub async fn item_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .iter()
            .map(|o| o.items.len())
            .sum()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, draft: OrderDraft) -> Result<Order> {
        let mut state = self.state.write().await;

        state.next_order_id += 1;
        let order_id = OrderId::new(state.next_order_id);
        let now = Utc::now();

        let mut items = Vec::with_capacity(draft.items.len());
        for item in draft.items {
            state.next_item_id += 1;
            items.push(OrderItem {
                id: state.next_item_id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        let order = Order {
            id: order_id,
            user_id: draft.user_id,
            status: draft.status,
            total_price: draft.total_price,
            shipping_address: draft.shipping_address,
            items,
            created_at: now,
            updated_at: now,
        };

        state.orders.push(order.clone());
        Ok(order)
    }

    async fn get_by_id(&self, order_id: OrderId) -> Result<Order> {
        self.state
            .read()
            .await
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_by_user(&self, user_id: UserId, limit: u32, offset: u32) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(orders
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|mut o| {
                o.items.clear();
                o
            })
            .collect())
    }

    async fn count_by_user(&self, user_id: UserId) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.orders.iter().filter(|o| o.user_id == user_id).count() as u64)
    }

    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StoreError::NotFound)?;

        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Address, DraftItem};
    use common::{Money, ProductId};

    fn address() -> Address {
        Address {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            country: "US".to_string(),
            postal_code: "62701".to_string(),
        }
    }

    fn draft(user_id: UserId, items: Vec<DraftItem>) -> OrderDraft {
        let total = items
            .iter()
            .map(|i| i.unit_price.multiply(i.quantity))
            .sum();
        OrderDraft::pending(user_id, total, address(), items)
    }

    #[tokio::test]
    async fn create_assigns_ids_and_links_items() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();

        let order = store
            .create(draft(
                user,
                vec![
                    DraftItem {
                        product_id: ProductId::new(1),
                        quantity: 2,
                        unit_price: Money::from_cents(1000),
                    },
                    DraftItem {
                        product_id: ProductId::new(2),
                        quantity: 1,
                        unit_price: Money::from_cents(500),
                    },
                ],
            ))
            .await
            .unwrap();

        assert_eq!(order.id, OrderId::new(1));
        assert_eq!(order.items.len(), 2);
        assert!(order.items.iter().all(|i| i.order_id == order.id));
        assert_eq!(order.total_price.cents(), 2500);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn get_by_id_returns_items() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        let created = store
            .create(draft(
                user,
                vec![DraftItem {
                    product_id: ProductId::new(1),
                    quantity: 3,
                    unit_price: Money::from_cents(200),
                }],
            ))
            .await
            .unwrap();

        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_missing_order() {
        let store = InMemoryOrderStore::new();
        let result = store.get_by_id(OrderId::new(42)).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn list_by_user_pages_newest_first() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        let other = UserId::new();

        for _ in 0..3 {
            store.create(draft(user, vec![])).await.unwrap();
        }
        store.create(draft(other, vec![])).await.unwrap();

        let page = store.list_by_user(user, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].id > page[1].id);

        let rest = store.list_by_user(user, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);

        assert_eq!(store.count_by_user(user).await.unwrap(), 3);
        assert_eq!(store.count_by_user(other).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_omits_items() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        store
            .create(draft(
                user,
                vec![DraftItem {
                    product_id: ProductId::new(1),
                    quantity: 1,
                    unit_price: Money::from_cents(100),
                }],
            ))
            .await
            .unwrap();

        let page = store.list_by_user(user, 10, 0).await.unwrap();
        assert!(page[0].items.is_empty());
    }

    #[tokio::test]
    async fn update_status_overwrites() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        let order = store.create(draft(user, vec![])).await.unwrap();

        store
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        let fetched = store.get_by_id(order.id).await.unwrap();
        assert_eq!(fetched.status, OrderStatus::Shipped);

        // No transition legality check: any status may follow any other.
        store
            .update_status(order.id, OrderStatus::Pending)
            .await
            .unwrap();
        let fetched = store.get_by_id(order.id).await.unwrap();
        assert_eq!(fetched.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn update_status_missing_order() {
        let store = InMemoryOrderStore::new();
        let result = store
            .update_status(OrderId::new(42), OrderStatus::Cancelled)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
