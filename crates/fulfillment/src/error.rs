//! Fulfillment error types.

use std::time::Duration;

use common::ProductId;
use order_store::StoreError;
use thiserror::Error;

use crate::services::ServiceError;

/// Why one line item failed validation.
///
/// `CreateOrder` is all-or-nothing: a single failing item fails the whole
/// call, and the aggregated error enumerates every failing item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemFailure {
    /// The catalog lookup for the item's price failed.
    #[error("product {0}: price lookup failed: {1}")]
    PriceLookup(ProductId, String),

    /// The availability check failed outright.
    #[error("product {0}: stock check failed: {1}")]
    StockCheck(ProductId, String),

    /// The stock check answered, but the requested quantity is not on hand.
    #[error("product {0}: reported unavailable")]
    Unavailable(ProductId),

    /// The requested quantity was zero.
    #[error("product {0}: quantity must be positive")]
    InvalidQuantity(ProductId),

    /// The validation task itself failed to run to completion.
    #[error("validation task failed: {0}")]
    Task(String),
}

impl ItemFailure {
    /// Returns the product this failure is about, when one is known.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            ItemFailure::PriceLookup(id, _)
            | ItemFailure::StockCheck(id, _)
            | ItemFailure::Unavailable(id)
            | ItemFailure::InvalidQuantity(id) => Some(*id),
            ItemFailure::Task(_) => None,
        }
    }
}

/// Errors that can occur during fulfillment operations.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The caller's token could not be resolved to a user identity.
    #[error("unauthorized, invalid token")]
    Unauthorized,

    /// The order was to be sourced from the cart, but the cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// One or more items failed validation; no order was created.
    #[error("order validation failed: {}", format_failures(.0))]
    ValidationFailed(Vec<ItemFailure>),

    /// The validation fan-out exceeded its time budget; no order was created.
    #[error("order validation timed out after {0:?}")]
    ValidationTimeout(Duration),

    /// The order store rejected the write or read.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An external collaborator was unreachable or answered with an error.
    #[error("collaborator error: {0}")]
    Service(#[from] ServiceError),
}

fn format_failures(failures: &[ItemFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for fulfillment operations.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
