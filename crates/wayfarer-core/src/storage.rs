//! Persistent client state using redb.
//!
//! The browser keeps tokens and preference flags in cookies. Here the same
//! small key/value state lives in a redb file, each entry carrying its own
//! expiry:
//! - Access, refresh, verification and reset tokens
//! - User preference flags
//!
//! Writes are last-writer-wins. Every write is its own transaction.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use redb::Database;
use serde::{Deserialize, Serialize};

use crate::auth::{TokenKind, TokenPair};
use crate::error::ClientResult;

mod credentials;
mod memory;

use credentials::{FLAGS_TABLE, TOKENS_TABLE};

pub use memory::MemoryStore;

/// Key/value access to credentials and preference flags.
///
/// Implemented by the redb-backed [`Storage`] and by [`MemoryStore`].
pub trait CredentialStore: Send + Sync {
    /// Current token of `kind`, or `None` when missing or expired
    fn token(&self, kind: TokenKind) -> ClientResult<Option<String>>;

    /// Store a token that expires after `ttl`
    fn save_token(&self, kind: TokenKind, value: &str, ttl: Duration) -> ClientResult<()>;

    fn remove_token(&self, kind: TokenKind) -> ClientResult<()>;

    /// Preference flag, or `None` when never set or expired
    fn flag(&self, name: &str) -> ClientResult<Option<bool>>;

    fn save_flag(&self, name: &str, value: bool, ttl: Duration) -> ClientResult<()>;

    /// Persist an access/refresh pair with their respective lifetimes
    fn save_pair(
        &self,
        pair: &TokenPair,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> ClientResult<()> {
        self.save_token(TokenKind::Access, &pair.access_token, access_ttl)?;
        self.save_token(TokenKind::Refresh, &pair.refresh_token, refresh_ttl)
    }

    /// Drop every stored token. Preference flags survive.
    fn clear_credentials(&self) -> ClientResult<()> {
        for kind in TokenKind::ALL {
            self.remove_token(kind)?;
        }
        Ok(())
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn token(&self, kind: TokenKind) -> ClientResult<Option<String>> {
        (**self).token(kind)
    }

    fn save_token(&self, kind: TokenKind, value: &str, ttl: Duration) -> ClientResult<()> {
        (**self).save_token(kind, value, ttl)
    }

    fn remove_token(&self, kind: TokenKind) -> ClientResult<()> {
        (**self).remove_token(kind)
    }

    fn flag(&self, name: &str) -> ClientResult<Option<bool>> {
        (**self).flag(name)
    }

    fn save_flag(&self, name: &str, value: bool, ttl: Duration) -> ClientResult<()> {
        (**self).save_flag(name, value, ttl)
    }

    fn save_pair(
        &self,
        pair: &TokenPair,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> ClientResult<()> {
        (**self).save_pair(pair, access_ttl, refresh_ttl)
    }

    fn clear_credentials(&self) -> ClientResult<()> {
        (**self).clear_credentials()
    }
}

/// A stored value with its expiry (unix seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredEntry<T> {
    pub value: T,
    pub expires_at: i64,
}

impl<T> StoredEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            value,
            expires_at: chrono::Utc::now().timestamp().saturating_add(ttl_secs),
        }
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at
    }

    /// The value, unless it has expired
    pub fn live(self) -> Option<T> {
        if self.is_expired() {
            None
        } else {
            Some(self.value)
        }
    }
}

/// Credential database backed by redb
#[derive(Clone)]
pub struct Storage {
    db: Arc<RwLock<Database>>,
}

impl Storage {
    /// Open (or create) the credential database at `path`, creating parent
    /// directories and the token and flag tables as needed.
    pub fn new(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TOKENS_TABLE)?;
            let _ = write_txn.open_table(FLAGS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
        })
    }

    /// Shared handle used by the table helpers
    pub fn db_handle(&self) -> Arc<RwLock<Database>> {
        self.db.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_opens_database_under_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        let config = crate::config::ClientConfig::new(
            crate::config::DEFAULT_API_URL,
            dir.path().join("profiles").join("ana"),
        )
        .unwrap();
        Storage::new(config.database_path()).unwrap();
        assert!(config.database_path().exists());
    }

    #[test]
    fn test_stored_entry_expiry() {
        let live = StoredEntry::new("a", Duration::from_secs(60));
        assert!(!live.is_expired());
        assert_eq!(live.live(), Some("a"));

        let dead = StoredEntry::new("b", Duration::ZERO);
        assert!(dead.is_expired());
        assert_eq!(dead.live(), None);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = StoredEntry::new(1u8, Duration::from_secs(u64::MAX));
        assert_eq!(entry.expires_at, i64::MAX);
        assert!(!entry.is_expired());
    }
}
