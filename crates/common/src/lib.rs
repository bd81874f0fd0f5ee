//! Shared types for the orderflow system.
//!
//! This crate provides the identifier newtypes, the money representation,
//! and the pagination envelope used across the store and fulfillment crates.

mod types;

pub use types::{Money, OrderId, Page, ProductId, UserId};
