//! Order persistence for the orderflow system.
//!
//! An order header and its line items are written as one atomic unit:
//! either every row is visible afterward or none is. Reads are plain
//! point/range reads with read-committed consistency.

mod error;
mod memory;
mod model;
mod postgres;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use model::{Address, DraftItem, Order, OrderDraft, OrderItem, OrderStatus};
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;
