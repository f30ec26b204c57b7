//! In-memory credential store
//!
//! Same semantics as [`Storage`](super::Storage) without touching disk.
//! Useful for tests and for short-lived sessions.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use super::{CredentialStore, StoredEntry};
use crate::auth::TokenKind;
use crate::error::ClientResult;

#[derive(Default)]
pub struct MemoryStore {
    tokens: Mutex<HashMap<TokenKind, StoredEntry<String>>>,
    flags: Mutex<HashMap<String, StoredEntry<bool>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("tokens", &self.tokens.lock().len())
            .field("flags", &self.flags.lock().len())
            .finish()
    }
}

impl CredentialStore for MemoryStore {
    fn token(&self, kind: TokenKind) -> ClientResult<Option<String>> {
        Ok(self
            .tokens
            .lock()
            .get(&kind)
            .cloned()
            .and_then(StoredEntry::live))
    }

    fn save_token(&self, kind: TokenKind, value: &str, ttl: Duration) -> ClientResult<()> {
        self.tokens
            .lock()
            .insert(kind, StoredEntry::new(value.to_string(), ttl));
        Ok(())
    }

    fn remove_token(&self, kind: TokenKind) -> ClientResult<()> {
        self.tokens.lock().remove(&kind);
        Ok(())
    }

    fn flag(&self, name: &str) -> ClientResult<Option<bool>> {
        Ok(self
            .flags
            .lock()
            .get(name)
            .cloned()
            .and_then(StoredEntry::live))
    }

    fn save_flag(&self, name: &str, value: bool, ttl: Duration) -> ClientResult<()> {
        self.flags
            .lock()
            .insert(name.to_string(), StoredEntry::new(value, ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_matches_disk_semantics() {
        let store = MemoryStore::new();
        store
            .save_token(TokenKind::Access, "a", Duration::from_secs(60))
            .unwrap();
        store
            .save_token(TokenKind::Refresh, "gone", Duration::ZERO)
            .unwrap();
        assert_eq!(store.token(TokenKind::Access).unwrap().as_deref(), Some("a"));
        assert!(store.token(TokenKind::Refresh).unwrap().is_none());

        store.save_flag("onboarded", true, Duration::from_secs(60)).unwrap();
        store.clear_credentials().unwrap();
        assert!(store.token(TokenKind::Access).unwrap().is_none());
        assert_eq!(store.flag("onboarded").unwrap(), Some(true));
    }
}
