//! Order-creation orchestration for the orderflow system.
//!
//! This crate drives the end-to-end order workflow: resolve the caller's
//! identity, source line items from the request or the user's cart, validate
//! every item concurrently against the catalog and the stock check under one
//! shared deadline, persist the order atomically, then apply best-effort
//! post-commit side effects (stock decrement, cart clearing) whose failure is
//! logged but never surfaced.
//!
//! External collaborators are consumed through the traits in [`services`];
//! each ships an in-memory implementation for tests.

pub mod error;
mod orchestrator;
pub mod services;
mod validator;

pub use error::{FulfillmentError, ItemFailure, Result};
pub use orchestrator::{OrderOrchestrator, OrderRequest};
pub use validator::{LineItem, ValidatedItem, validate_item};
