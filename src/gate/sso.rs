//! Cross-session single-sign-on registry.
//!
//! One successful authentication registers an opaque token that cooperating
//! sessions can later resolve back into the full authentication record. The
//! registry entry is created once and never mutated; invalidation is the
//! registry owner's responsibility, not this crate's.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::request::Principal;

/// Name of the cookie carrying the SSO token.
pub const SSO_COOKIE: &str = "gardisto_sso";

/// Everything needed to reconstruct an authentication from an SSO token.
#[derive(Clone, Debug)]
pub struct SsoEntry {
    pub principal: Principal,
    pub auth_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub realm_name: String,
}

/// Registry mapping SSO tokens to authentication records.
pub trait SsoRegistry: Send + Sync {
    fn register(&self, token: &str, entry: SsoEntry);

    fn lookup(&self, token: &str) -> Option<SsoEntry>;
}

/// In-memory registry for tests and the demo server.
#[derive(Debug, Default)]
pub struct MemorySsoRegistry {
    entries: RwLock<HashMap<String, SsoEntry>>,
}

impl MemorySsoRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SsoRegistry for MemorySsoRegistry {
    fn register(&self, token: &str, entry: SsoEntry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(token.to_string(), entry);
    }

    fn lookup(&self, token: &str) -> Option<SsoEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup() {
        let registry = MemorySsoRegistry::new();
        registry.register(
            "AABB",
            SsoEntry {
                principal: Principal::new("alice"),
                auth_type: "FORM".to_string(),
                username: Some("alice".to_string()),
                password: None,
                realm_name: "Gardisto".to_string(),
            },
        );
        let entry = registry.lookup("AABB").expect("entry");
        assert_eq!(entry.principal.name(), "alice");
        assert_eq!(entry.realm_name, "Gardisto");
        assert!(registry.lookup("CCDD").is_none());
    }
}
