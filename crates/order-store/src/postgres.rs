use async_trait::async_trait;
use common::{Money, OrderId, ProductId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Address, Order, OrderDraft, OrderItem, OrderStatus, OrderStore, Result, StoreError};

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_header(row: PgRow) -> Result<Order> {
        let status_raw: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_raw).ok_or(StoreError::InvalidStatus(status_raw))?;

        let address_json: serde_json::Value = row.try_get("shipping_address")?;
        let shipping_address: Address = serde_json::from_value(address_json)?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            status,
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            shipping_address,
            items: Vec::new(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderItem {
            id: row.try_get("id")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: quantity as u32,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, draft), fields(user_id = %draft.user_id))]
    async fn create(&self, draft: OrderDraft) -> Result<Order> {
        let address_json = serde_json::to_value(&draft.shipping_address)?;

        let mut tx = self.pool.begin().await?;

        let header = sqlx::query(
            r#"
            INSERT INTO orders (user_id, status, total_price_cents, shipping_address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(draft.user_id.as_uuid())
        .bind(draft.status.as_str())
        .bind(draft.total_price.cents())
        .bind(&address_json)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let order_id = OrderId::new(header.try_get("id")?);
        let created_at = header.try_get("created_at")?;
        let updated_at = header.try_get("updated_at")?;

        let mut items = Vec::with_capacity(draft.items.len());
        for item in &draft.items {
            let item_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(order_id.as_i64())
            .bind(item.product_id.as_i64())
            .bind(item.quantity as i32)
            .bind(item.unit_price.cents())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

            items.push(OrderItem {
                id: item_id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(%order_id, item_count = items.len(), "order persisted");

        Ok(Order {
            id: order_id,
            user_id: draft.user_id,
            status: draft.status,
            total_price: draft.total_price,
            shipping_address: draft.shipping_address,
            items,
            created_at,
            updated_at,
        })
    }

    async fn get_by_id(&self, order_id: OrderId) -> Result<Order> {
        let header = sqlx::query(
            r#"
            SELECT id, user_id, status, total_price_cents, shipping_address, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        let mut order = Self::row_to_header(header)?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        order.items = item_rows
            .into_iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(order)
    }

    async fn list_by_user(&self, user_id: UserId, limit: u32, offset: u32) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, status, total_price_cents, shipping_address, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(Self::row_to_header).collect()
    }

    async fn count_by_user(&self, user_id: UserId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*)
            FROM orders
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(count as u64)
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = now()
            WHERE id = $2
            "#,
        )
        .bind(status.as_str())
        .bind(order_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

fn map_db_error(err: sqlx::Error) -> StoreError {
    if matches!(err, sqlx::Error::RowNotFound) {
        return StoreError::NotFound;
    }

    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            // Unique constraint violation
            Some("23505") => return StoreError::DuplicateEntry,
            // Foreign key violation
            Some("23503") => return StoreError::ReferentialViolation(db_err.message().to_string()),
            _ => {}
        }
    }

    StoreError::Database(err)
}
