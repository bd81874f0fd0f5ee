//! Auth collaborator contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;

use super::ServiceError;

/// Trait for resolving bearer tokens to user identities.
///
/// The real implementation verifies and caches tokens elsewhere; the
/// orchestrator only needs "who is this, or reject".
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolves a token to the user it was issued for.
    async fn validate_token(&self, token: &str) -> Result<UserId, ServiceError>;
}

/// In-memory auth service for testing. Resolves only tokens it has issued.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthService {
    tokens: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemoryAuthService {
    /// Creates a new in-memory auth service with no known tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token as belonging to the given user.
    pub fn issue(&self, token: impl Into<String>, user_id: UserId) {
        self.tokens.write().unwrap().insert(token.into(), user_id);
    }

    /// Forgets a token, simulating expiry or revocation.
    pub fn revoke(&self, token: &str) {
        self.tokens.write().unwrap().remove(token);
    }
}

#[async_trait]
impl AuthService for InMemoryAuthService {
    async fn validate_token(&self, token: &str) -> Result<UserId, ServiceError> {
        self.tokens
            .read()
            .unwrap()
            .get(token)
            .copied()
            .ok_or(ServiceError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_issued_token() {
        let auth = InMemoryAuthService::new();
        let user = UserId::new();
        auth.issue("token-1", user);

        assert_eq!(auth.validate_token("token-1").await.unwrap(), user);
    }

    #[tokio::test]
    async fn rejects_unknown_and_revoked_tokens() {
        let auth = InMemoryAuthService::new();
        let user = UserId::new();
        auth.issue("token-1", user);

        assert_eq!(
            auth.validate_token("other").await,
            Err(ServiceError::Unauthorized)
        );

        auth.revoke("token-1");
        assert_eq!(
            auth.validate_token("token-1").await,
            Err(ServiceError::Unauthorized)
        );
    }
}
