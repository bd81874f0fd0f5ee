use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the stock ledger.
#[derive(Debug, Error)]
pub enum StockError {
    /// The conditional write rejected a decrease because the resulting
    /// quantity would have gone negative.
    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    /// No stock record exists for the product.
    #[error("stock record not found for product {0}")]
    NotFound(ProductId),

    /// A stock record already exists for the product.
    #[error("duplicate stock record for product {0}")]
    DuplicateEntry(ProductId),

    /// A foreign key constraint was violated.
    #[error("referential violation: {0}")]
    ReferentialViolation(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for stock ledger operations.
pub type Result<T> = std::result::Result<T, StockError>;
