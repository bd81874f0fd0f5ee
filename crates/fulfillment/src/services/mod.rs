//! Contracts for the external collaborators the orchestrator consumes.
//!
//! Token verification, the product catalog, the remote stock check, and the
//! cart live in other services; this module defines the traits the
//! orchestrator calls them through, plus in-memory implementations for
//! testing. The HTTP bindings for these contracts belong to the transport
//! layer and are out of scope here.

mod auth;
mod cart;
mod catalog;
mod stock;

pub use auth::{AuthService, InMemoryAuthService};
pub use cart::{CartLine, CartService, InMemoryCartService};
pub use catalog::{CatalogService, InMemoryCatalogService, Product};
pub use stock::{InMemoryStockService, LedgerStockService, StockDirection, StockService};

use thiserror::Error;

/// Errors surfaced by external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The credential was rejected.
    #[error("unauthorized, invalid token")]
    Unauthorized,

    /// The catalog has no such product.
    #[error("product not found")]
    ProductNotFound,

    /// The user has no cart.
    #[error("cart not found")]
    CartNotFound,

    /// The collaborator was unreachable or answered with a non-success.
    #[error("transport error: {0}")]
    Transport(String),
}
