//! Two-scope credential store.
//!
//! Mirrors the durable/session split browsers give web apps: reads consult
//! the durable scope first and fall back to the session scope, writes land in
//! exactly one scope, and `clear` wipes both. Each key is resolved
//! independently, so a token found in one scope may pair with an expiry found
//! in the other.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use redb::{Database, ReadableTable, TableDefinition};
use thiserror::Error;

use super::credential::{Credential, now_ms};

const TOKEN_KEY: &str = "auth_token";
const EXPIRES_KEY: &str = "token_expires";
const ADMIN_KEY: &str = "admin_verified";

const AUTH_TABLE: TableDefinition<&str, &str> = TableDefinition::new("auth");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

fn storage_err(err: impl std::fmt::Display) -> StoreError {
    StoreError::Storage(err.to_string())
}

/// String-keyed storage scope. Implementations decide durability.
pub trait TokenScope: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process scope, gone when the process exits.
#[derive(Default)]
pub struct MemoryScope {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::Storage("scope lock poisoned".into()))
    }
}

impl TokenScope for MemoryScope {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Durable scope backed by a `redb` database file.
pub struct RedbScope {
    db: Database,
}

impl RedbScope {
    /// Opens the database at `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(storage_err)?;
        Ok(Self { db })
    }
}

impl TokenScope for RedbScope {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = match txn.open_table(AUTH_TABLE) {
            Ok(table) => table,
            // A database nothing was written to yet has no table.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(storage_err(err)),
        };
        let value = table.get(key).map_err(storage_err)?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = txn.open_table(AUTH_TABLE).map_err(storage_err)?;
            table.insert(key, value).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = txn.open_table(AUTH_TABLE).map_err(storage_err)?;
            table.remove(key).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(())
    }
}

/// Credential store over a durable and a session scope.
pub struct TokenStore {
    durable: Arc<dyn TokenScope>,
    session: Arc<dyn TokenScope>,
}

impl TokenStore {
    pub fn new(durable: Arc<dyn TokenScope>, session: Arc<dyn TokenScope>) -> Self {
        Self { durable, session }
    }

    /// Store that keeps everything in process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryScope::new()), Arc::new(MemoryScope::new()))
    }

    // An empty stored string reads as absent.
    fn read_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.durable.get(key)? {
            Some(value) if !value.is_empty() => Ok(Some(value)),
            _ => match self.session.get(key)? {
                Some(value) if !value.is_empty() => Ok(Some(value)),
                _ => Ok(None),
            },
        }
    }

    /// Stored bearer token, if any scope holds one.
    pub fn token(&self) -> Result<Option<String>, StoreError> {
        self.read_key(TOKEN_KEY)
    }

    /// Stored expiry in milliseconds since epoch. Absent or unparseable
    /// values read as zero, which downstream checks treat as expired.
    pub fn expires_at_ms(&self) -> Result<i64, StoreError> {
        Ok(self
            .read_key(EXPIRES_KEY)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(0))
    }

    /// Credential assembled from the stored keys.
    pub fn get(&self) -> Result<Option<Credential>, StoreError> {
        let Some(token) = self.token()? else {
            return Ok(None);
        };
        Ok(Some(Credential::new(token, self.expires_at_ms()?)))
    }

    /// Writes token and expiry into exactly one scope.
    pub fn set(&self, credential: &Credential, persistent: bool) -> Result<(), StoreError> {
        let scope = self.scope_for(persistent);
        scope.set(TOKEN_KEY, credential.token())?;
        scope.set(EXPIRES_KEY, &credential.expires_at_ms().to_string())?;
        Ok(())
    }

    /// Removes every auth key from both scopes.
    pub fn clear(&self) -> Result<(), StoreError> {
        for scope in [&self.durable, &self.session] {
            for key in [TOKEN_KEY, EXPIRES_KEY, ADMIN_KEY] {
                scope.remove(key)?;
            }
        }
        Ok(())
    }

    pub fn is_expired(&self) -> Result<bool, StoreError> {
        Ok(self.expires_at_ms()? <= now_ms())
    }

    /// Remaining lifetime in milliseconds, clamped at zero.
    pub fn remaining_ms(&self) -> Result<i64, StoreError> {
        Ok((self.expires_at_ms()? - now_ms()).max(0))
    }

    /// True while a token is live but inside the buffer window.
    pub fn expiring_soon(&self, buffer_ms: i64) -> Result<bool, StoreError> {
        let remaining = self.remaining_ms()?;
        Ok(remaining > 0 && remaining <= buffer_ms)
    }

    /// Present and unexpired credential. This is the guard consulted before
    /// every authenticated call.
    pub fn live(&self) -> Result<Option<Credential>, StoreError> {
        match self.get()? {
            Some(credential) if !credential.is_expired() => Ok(Some(credential)),
            _ => Ok(None),
        }
    }

    pub fn admin_verified(&self) -> Result<bool, StoreError> {
        Ok(self.read_key(ADMIN_KEY)?.as_deref() == Some("true"))
    }

    pub fn set_admin_verified(&self, persistent: bool) -> Result<(), StoreError> {
        self.scope_for(persistent).set(ADMIN_KEY, "true")
    }

    fn scope_for(&self, persistent: bool) -> &Arc<dyn TokenScope> {
        if persistent { &self.durable } else { &self.session }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(tag: &str) -> std::path::PathBuf {
        let unique: u64 = rand::random();
        std::env::temp_dir().join(format!("blogadmin-{tag}-{unique}.redb"))
    }

    #[test]
    fn session_write_stays_out_of_the_durable_scope() {
        let store = TokenStore::in_memory();
        store
            .set(&Credential::new("tok", now_ms() + 60_000), false)
            .unwrap();

        let found = store.get().unwrap().unwrap();
        assert_eq!(found.token(), "tok");
        assert!(store.durable.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn durable_scope_wins_on_reads() {
        let store = TokenStore::in_memory();
        store
            .set(&Credential::new("session-tok", now_ms() + 60_000), false)
            .unwrap();
        store
            .set(&Credential::new("durable-tok", now_ms() + 60_000), true)
            .unwrap();

        assert_eq!(store.token().unwrap().as_deref(), Some("durable-tok"));
    }

    #[test]
    fn keys_resolve_independently_across_scopes() {
        let store = TokenStore::in_memory();
        store.session.set(TOKEN_KEY, "tok").unwrap();
        let expires = now_ms() + 60_000;
        store
            .durable
            .set(EXPIRES_KEY, &expires.to_string())
            .unwrap();

        let found = store.get().unwrap().unwrap();
        assert_eq!(found.token(), "tok");
        assert_eq!(found.expires_at_ms(), expires);
    }

    #[test]
    fn clear_wipes_both_scopes() {
        let store = TokenStore::in_memory();
        store
            .set(&Credential::new("a", now_ms() + 60_000), true)
            .unwrap();
        store
            .set(&Credential::new("b", now_ms() + 60_000), false)
            .unwrap();
        store.set_admin_verified(true).unwrap();

        store.clear().unwrap();

        assert!(store.get().unwrap().is_none());
        assert!(!store.admin_verified().unwrap());
        assert!(store.session.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn missing_expiry_reads_as_expired() {
        let store = TokenStore::in_memory();
        store.session.set(TOKEN_KEY, "tok").unwrap();

        assert!(store.is_expired().unwrap());
        assert_eq!(store.remaining_ms().unwrap(), 0);
        assert!(store.live().unwrap().is_none());
    }

    #[test]
    fn garbage_expiry_reads_as_expired() {
        let store = TokenStore::in_memory();
        store.session.set(TOKEN_KEY, "tok").unwrap();
        store.session.set(EXPIRES_KEY, "not-a-number").unwrap();

        assert!(store.is_expired().unwrap());
    }

    #[test]
    fn expiry_instant_is_a_dead_token() {
        let store = TokenStore::in_memory();
        let credential = Credential::new("tok", now_ms());
        store.set(&credential, false).unwrap();

        assert!(store.is_expired().unwrap());
        assert!(store.live().unwrap().is_none());
    }

    #[test]
    fn live_returns_unexpired_credentials() {
        let store = TokenStore::in_memory();
        store
            .set(&Credential::new("tok", now_ms() + 60_000), false)
            .unwrap();

        let live = store.live().unwrap().unwrap();
        assert_eq!(live.token(), "tok");
    }

    #[test]
    fn empty_token_reads_as_absent() {
        let store = TokenStore::in_memory();
        store.durable.set(TOKEN_KEY, "").unwrap();
        store.session.set(TOKEN_KEY, "tok").unwrap();

        assert_eq!(store.token().unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn expiring_soon_respects_the_buffer() {
        let store = TokenStore::in_memory();
        store
            .set(&Credential::new("tok", now_ms() + 10 * 60 * 1000), false)
            .unwrap();

        assert!(store.expiring_soon(30 * 60 * 1000).unwrap());
        assert!(!store.expiring_soon(5 * 60 * 1000).unwrap());
    }

    #[test]
    fn redb_scope_round_trips() {
        let path = temp_db_path("roundtrip");
        let scope = RedbScope::open(&path).unwrap();

        assert!(scope.get(TOKEN_KEY).unwrap().is_none());

        scope.set(TOKEN_KEY, "tok").unwrap();
        assert_eq!(scope.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));

        scope.remove(TOKEN_KEY).unwrap();
        assert!(scope.get(TOKEN_KEY).unwrap().is_none());

        drop(scope);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn redb_scope_backs_a_store() {
        let path = temp_db_path("store");
        let store = TokenStore::new(
            Arc::new(RedbScope::open(&path).unwrap()),
            Arc::new(MemoryScope::new()),
        );

        store
            .set(&Credential::new("tok", now_ms() + 60_000), true)
            .unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("tok"));

        store.clear().unwrap();
        assert!(store.token().unwrap().is_none());

        let _ = std::fs::remove_file(&path);
    }
}
