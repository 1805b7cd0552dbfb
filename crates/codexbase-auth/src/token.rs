//! Bearer token to user id resolution.

use codexbase_types::UserId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Registry of opaque bearer tokens.
///
/// Token issuance and cryptographic validation live with the external
/// identity provider; this registry only maps already-validated opaque
/// tokens to the user they were issued for, which is all the core consumes.
#[derive(Default)]
pub struct TokenRegistry {
    tokens: RwLock<HashMap<String, UserId>>,
}

impl TokenRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for a user, replacing any previous binding.
    pub fn register(&self, token: impl Into<String>, user: UserId) {
        self.tokens.write().insert(token.into(), user);
    }

    /// Resolves a token to its user, if registered.
    pub fn resolve(&self, token: &str) -> Option<UserId> {
        self.tokens.read().get(token).cloned()
    }

    /// Revokes a token. Unknown tokens are ignored.
    pub fn revoke(&self, token: &str) {
        self.tokens.write().remove(token);
    }
}
