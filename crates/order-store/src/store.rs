use async_trait::async_trait;
use common::{OrderId, UserId};

use crate::{Order, OrderDraft, OrderStatus, Result};

/// Storage abstraction for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order header and all of its items as one atomic unit.
    ///
    /// Returns the order with its assigned ids and timestamps. If any row
    /// fails to write, none are visible afterward.
    async fn create(&self, draft: OrderDraft) -> Result<Order>;

    /// Returns an order with its items.
    async fn get_by_id(&self, order_id: OrderId) -> Result<Order>;

    /// Returns a page of a user's order headers, newest first.
    ///
    /// Items are not loaded on list reads.
    async fn list_by_user(&self, user_id: UserId, limit: u32, offset: u32) -> Result<Vec<Order>>;

    /// Returns how many orders the user has placed.
    async fn count_by_user(&self, user_id: UserId) -> Result<u64>;

    /// Overwrites an order's status.
    ///
    /// Reports [`StoreError::NotFound`](crate::StoreError::NotFound) if no
    /// row matched. Any status may follow any other; there is no state
    /// machine here.
    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()>;
}
