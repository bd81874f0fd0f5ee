use async_trait::async_trait;
use common::ProductId;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{Result, StockError, StockLedger, StockRecord};

/// PostgreSQL-backed stock ledger.
///
/// The no-oversell guarantee is pushed entirely into the guarded `UPDATE` in
/// [`adjust_quantity`](StockLedger::adjust_quantity); no advisory locks or
/// serializable transactions are needed.
#[derive(Clone)]
pub struct PostgresStockLedger {
    pool: PgPool,
}

impl PostgresStockLedger {
    /// Creates a new PostgreSQL stock ledger.
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

    fn row_to_record(row: PgRow) -> Result<StockRecord> {
        Ok(StockRecord {
            id: row.try_get("id")?,
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get("quantity")?,
        })
    }
}

#[async_trait]
impl StockLedger for PostgresStockLedger {
    async fn create(&self, product_id: ProductId, quantity: u32) -> Result<StockRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO stock_records (product_id, quantity)
            VALUES ($1, $2)
            RETURNING id, product_id, quantity
            "#,
        )
        .bind(product_id.as_i64())
        .bind(quantity as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, product_id))?;

        Self::row_to_record(row)
    }

    async fn get(&self, product_id: ProductId) -> Result<StockRecord> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, quantity
            FROM stock_records
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, product_id))?;

        Self::row_to_record(row)
    }

    #[tracing::instrument(skip(self))]
    async fn adjust_quantity(&self, product_id: ProductId, delta: i64) -> Result<()> {
        // Condition and write in one statement: the row is only touched if
        // the resulting quantity stays non-negative.
        let result = sqlx::query(
            r#"
            UPDATE stock_records
            SET quantity = quantity + $1
            WHERE product_id = $2 AND quantity + $1 >= 0
            "#,
        )
        .bind(delta)
        .bind(product_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, product_id))?;

        if result.rows_affected() == 0 {
            if delta < 0 {
                metrics::counter!("stock_adjust_rejected_total").increment(1);
                return Err(StockError::InsufficientStock(product_id));
            }
            return Err(StockError::NotFound(product_id));
        }

        Ok(())
    }

    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        let available: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT quantity >= $2
            FROM stock_records
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_i64())
        .bind(quantity as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, product_id))?;

        available.ok_or(StockError::NotFound(product_id))
    }
}

fn map_db_error(err: sqlx::Error, product_id: ProductId) -> StockError {
    if matches!(err, sqlx::Error::RowNotFound) {
        return StockError::NotFound(product_id);
    }

    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            // Unique constraint violation
            Some("23505") => return StockError::DuplicateEntry(product_id),
            // Foreign key violation
            Some("23503") => return StockError::ReferentialViolation(db_err.message().to_string()),
            _ => {}
        }
    }

    StockError::Database(err)
}
