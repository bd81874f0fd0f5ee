//! Cart collaborator contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ProductId;

use super::ServiceError;

/// One pending line in a user's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Trait for fetching and clearing a user's cart.
///
/// The cart service resolves the token itself; the orchestrator passes the
/// caller's token through unchanged.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Returns the user's pending cart lines.
    async fn get_cart(&self, auth_token: &str) -> Result<Vec<CartLine>, ServiceError>;

    /// Empties the user's cart.
    async fn clear_cart(&self, auth_token: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct CartState {
    carts: HashMap<String, Vec<CartLine>>,
    fail_on_get: bool,
    fail_on_clear: bool,
}

/// In-memory cart service for testing. Carts are keyed by token.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<RwLock<CartState>>,
}

impl InMemoryCartService {
    /// Creates a new in-memory cart service with no carts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cart stored for a token.
    pub fn set_lines(&self, token: impl Into<String>, lines: Vec<CartLine>) {
        self.state.write().unwrap().carts.insert(token.into(), lines);
    }

    /// Returns the cart currently stored for a token.
    pub fn lines(&self, token: &str) -> Vec<CartLine> {
        self.state
            .read()
            .unwrap()
            .carts
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every fetch fail.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Makes every clear fail.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.state.write().unwrap().fail_on_clear = fail;
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn get_cart(&self, auth_token: &str) -> Result<Vec<CartLine>, ServiceError> {
        let state = self.state.read().unwrap();
        if state.fail_on_get {
            return Err(ServiceError::CartNotFound);
        }
        Ok(state.carts.get(auth_token).cloned().unwrap_or_default())
    }

    async fn clear_cart(&self, auth_token: &str) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_clear {
            return Err(ServiceError::Transport(
                "cart service unreachable".to_string(),
            ));
        }
        state.carts.remove(auth_token);
        Ok(())
    }
}
