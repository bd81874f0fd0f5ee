use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was not found.
    #[error("order not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("duplicate resource entry")]
    DuplicateEntry,

    /// A foreign key constraint was violated.
    #[error("referential violation: {0}")]
    ReferentialViolation(String),

    /// A stored status string was not recognized.
    #[error("invalid order status: {0}")]
    InvalidStatus(String),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
