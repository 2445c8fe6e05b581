//! LMDB-backed durable substrate.
//!
//! Uses the heed crate (Rust bindings for LMDB) to give the durable tiers a
//! memory-mapped store that survives process restarts. One environment holds
//! two named databases: `persistent` keeps its contents across sessions,
//! `session` is cleared every time it is opened.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. Every substrate call is one transaction:
//! read transactions for `get_item`/`keys`/`item_count`, write transactions
//! for `set_item`/`remove_item`.

use std::path::Path;

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};

use crate::traits::KeyValueStore;
use promptforge_core::{CacheError, ForgeError, ForgeResult};

/// Database name for the cross-session tier.
pub const PERSISTENT_DB: &str = "persistent";

/// Database name for the per-session tier.
pub const SESSION_DB: &str = "session";

/// Error type for LMDB substrate operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open a database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The map is full; behaves like an exhausted quota.
    #[error("Storage quota exceeded writing key {0}")]
    QuotaExceeded(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert LmdbStoreError into the absorbed cache taxonomy.
impl From<LmdbStoreError> for ForgeError {
    fn from(e: LmdbStoreError) -> Self {
        match e {
            LmdbStoreError::QuotaExceeded(key) => CacheError::QuotaExceeded { key }.into(),
            other => CacheError::StoreUnavailable {
                reason: other.to_string(),
            }
            .into(),
        }
    }
}

/// One named LMDB database exposed through the substrate interface.
#[derive(Debug, Clone)]
pub struct LmdbStore {
    env: Env,
    db: Database<Str, Str>,
}

impl LmdbStore {
    /// Open (creating if needed) the LMDB environment shared by both
    /// durable tiers.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files are stored
    /// * `max_size_mb` - Maximum size of the map in megabytes
    pub fn open_env<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Env, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(2)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        Ok(env)
    }

    /// Open the named database inside `env`, creating it if absent.
    pub fn create(env: &Env, name: &str) -> Result<Self, LmdbStoreError> {
        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, Some(name))
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(Self {
            env: env.clone(),
            db,
        })
    }

    /// Open the named database and discard whatever it held. This is the
    /// per-session tier's constructor: a new session starts empty.
    pub fn create_cleared(env: &Env, name: &str) -> Result<Self, LmdbStoreError> {
        let store = Self::create(env, name)?;

        let mut wtxn = store
            .env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;
        store
            .db
            .clear(&mut wtxn)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        tracing::debug!(db = name, "Cleared session database on open");
        Ok(store)
    }
}

impl KeyValueStore for LmdbStore {
    fn get_item(&self, key: &str) -> ForgeResult<Option<String>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let value = self
            .db
            .get(&rtxn, key)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(value.map(|s| s.to_string()))
    }

    fn set_item(&self, key: &str, value: &str) -> ForgeResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        self.db.put(&mut wtxn, key, value).map_err(|e| match e {
            heed::Error::Mdb(heed::MdbError::MapFull) => {
                LmdbStoreError::QuotaExceeded(key.to_string())
            }
            other => LmdbStoreError::Transaction(other.to_string()),
        })?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> ForgeResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        self.db
            .delete(&mut wtxn, key)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    fn keys(&self) -> ForgeResult<Vec<String>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let iter = self
            .db
            .iter(&rtxn)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let mut keys = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;
            keys.push(key.to_string());
        }
        Ok(keys)
    }

    fn item_count(&self) -> ForgeResult<usize> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let len = self
            .db
            .len(&rtxn)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(len as usize)
    }
}
