//! Token and preference-flag tables
//!
//! Values are JSON-encoded [`StoredEntry`] records so expiry travels with
//! the value, the way a cookie carries its own `Expires`.

use std::time::Duration;

use redb::{Table, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{CredentialStore, Storage, StoredEntry};
use crate::auth::{TokenKind, TokenPair};
use crate::error::ClientResult;

/// Table for tokens (key: TokenKind::key(), value: JSON StoredEntry<String>)
pub(crate) const TOKENS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tokens");

/// Table for preference flags (key: flag name, value: JSON StoredEntry<bool>)
pub(crate) const FLAGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("flags");

impl Storage {
    fn put<T: Serialize>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        key: &str,
        entry: &StoredEntry<T>,
    ) -> ClientResult<()> {
        let db = self.db_handle();
        let db_guard = db.read();
        let write_txn = db_guard.begin_write()?;
        {
            let mut table = write_txn.open_table(table_def)?;
            let data = serde_json::to_vec(entry)?;
            table.insert(key, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> ClientResult<Option<StoredEntry<T>>> {
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(table_def)?;

        match table.get(key)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    /// Apply several token edits in one write transaction.
    ///
    /// Nothing is committed when `apply` fails.
    fn write_tokens<F>(&self, apply: F) -> ClientResult<()>
    where
        F: FnOnce(&mut Table<'_, &'static str, &'static [u8]>) -> ClientResult<()>,
    {
        let db = self.db_handle();
        let db_guard = db.read();
        let write_txn = db_guard.begin_write()?;
        {
            let mut table = write_txn.open_table(TOKENS_TABLE)?;
            apply(&mut table)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, table_def: TableDefinition<&str, &[u8]>, key: &str) -> ClientResult<()> {
        let db = self.db_handle();
        let db_guard = db.read();
        let write_txn = db_guard.begin_write()?;
        {
            let mut table = write_txn.open_table(table_def)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl CredentialStore for Storage {
    fn token(&self, kind: TokenKind) -> ClientResult<Option<String>> {
        let entry: Option<StoredEntry<String>> = self.get(TOKENS_TABLE, kind.key())?;
        Ok(entry.and_then(StoredEntry::live))
    }

    fn save_token(&self, kind: TokenKind, value: &str, ttl: Duration) -> ClientResult<()> {
        debug!(%kind, ttl_secs = ttl.as_secs(), "Saving token");
        self.put(TOKENS_TABLE, kind.key(), &StoredEntry::new(value.to_string(), ttl))
    }

    fn remove_token(&self, kind: TokenKind) -> ClientResult<()> {
        self.remove(TOKENS_TABLE, kind.key())
    }

    fn flag(&self, name: &str) -> ClientResult<Option<bool>> {
        let entry: Option<StoredEntry<bool>> = self.get(FLAGS_TABLE, name)?;
        Ok(entry.and_then(StoredEntry::live))
    }

    fn save_flag(&self, name: &str, value: bool, ttl: Duration) -> ClientResult<()> {
        self.put(FLAGS_TABLE, name, &StoredEntry::new(value, ttl))
    }

    fn save_pair(
        &self,
        pair: &TokenPair,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> ClientResult<()> {
        debug!(access_ttl_secs = access_ttl.as_secs(), "Saving token pair");
        let access = serde_json::to_vec(&StoredEntry::new(pair.access_token.clone(), access_ttl))?;
        let refresh =
            serde_json::to_vec(&StoredEntry::new(pair.refresh_token.clone(), refresh_ttl))?;
        self.write_tokens(|table| {
            table.insert(TokenKind::Access.key(), access.as_slice())?;
            table.insert(TokenKind::Refresh.key(), refresh.as_slice())?;
            Ok(())
        })
    }

    fn clear_credentials(&self) -> ClientResult<()> {
        self.write_tokens(|table| {
            for kind in TokenKind::ALL {
                table.remove(kind.key())?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(86_400);

    fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.redb");
        let storage = Storage::new(&db_path).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_tokens_are_stored_independently() {
        let (storage, _temp) = create_test_storage();

        storage.save_token(TokenKind::Access, "acc", DAY).unwrap();
        storage
            .save_token(TokenKind::EmailVerification, "ver", DAY)
            .unwrap();

        assert_eq!(storage.token(TokenKind::Access).unwrap().as_deref(), Some("acc"));
        assert_eq!(
            storage.token(TokenKind::EmailVerification).unwrap().as_deref(),
            Some("ver")
        );
        assert!(storage.token(TokenKind::Refresh).unwrap().is_none());
        assert!(storage.token(TokenKind::ResetPassword).unwrap().is_none());
    }

    #[test]
    fn test_expired_token_reads_as_missing() {
        let (storage, _temp) = create_test_storage();
        storage
            .save_token(TokenKind::Access, "stale", Duration::ZERO)
            .unwrap();
        assert!(storage.token(TokenKind::Access).unwrap().is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let (storage, _temp) = create_test_storage();
        storage.save_token(TokenKind::Access, "one", DAY).unwrap();
        storage.save_token(TokenKind::Access, "two", DAY).unwrap();
        assert_eq!(storage.token(TokenKind::Access).unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_clear_credentials_keeps_flags() {
        let (storage, _temp) = create_test_storage();
        let pair = TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        };
        storage.save_pair(&pair, DAY, DAY * 30).unwrap();
        storage.save_flag("dark_mode", true, DAY * 365).unwrap();

        storage.clear_credentials().unwrap();

        for kind in TokenKind::ALL {
            assert!(storage.token(kind).unwrap().is_none());
        }
        assert_eq!(storage.flag("dark_mode").unwrap(), Some(true));
    }

    #[test]
    fn test_save_pair_applies_both_lifetimes() {
        let (storage, _temp) = create_test_storage();
        let pair = TokenPair {
            access_token: "short".into(),
            refresh_token: "long".into(),
        };
        storage.save_pair(&pair, Duration::ZERO, DAY).unwrap();
        assert!(storage.token(TokenKind::Access).unwrap().is_none());
        assert_eq!(storage.token(TokenKind::Refresh).unwrap().as_deref(), Some("long"));
    }

    #[test]
    fn test_interrupted_token_write_leaves_session_intact() {
        let (storage, _temp) = create_test_storage();
        let pair = TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        };
        storage.save_pair(&pair, DAY, DAY).unwrap();

        let result = storage.write_tokens(|table| {
            table.remove(TokenKind::Access.key())?;
            Err(ClientError::Storage("interrupted".into()))
        });

        assert!(result.is_err());
        assert_eq!(storage.token(TokenKind::Access).unwrap().as_deref(), Some("a"));
        assert_eq!(storage.token(TokenKind::Refresh).unwrap().as_deref(), Some("r"));
    }

    #[test]
    fn test_tokens_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.redb");

        {
            let storage = Storage::new(&db_path).unwrap();
            storage.save_token(TokenKind::Refresh, "keep-me", DAY).unwrap();
        }

        let storage = Storage::new(&db_path).unwrap();
        assert_eq!(
            storage.token(TokenKind::Refresh).unwrap().as_deref(),
            Some("keep-me")
        );
    }

    #[test]
    fn test_remove_missing_token_is_ok() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.remove_token(TokenKind::ResetPassword).is_ok());
    }
}
