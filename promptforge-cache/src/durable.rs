//! Durable tier adapter and the in-memory substrate.

use crate::entry::{CacheEntry, Tier};
use crate::traits::{KeyValueStore, TierBackend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptforge_core::{CacheError, ForgeResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// Durable tier over any `KeyValueStore`.
///
/// Entries are stored as the self-describing JSON record
/// `{data, storedAt, ttl, tags}`. A record that fails to decode is deleted
/// on sight and reported absent; decode problems never leave this adapter.
/// Substrate availability problems do propagate, for the manager to absorb
/// and log. There is no materialized tag index here: tag and expiry purges
/// scan and decode, which stays correct across process restarts.
pub struct StorageTier {
    tier: Tier,
    store: Box<dyn KeyValueStore>,
}

impl StorageTier {
    /// Adapt `store` as the backend for `tier`.
    pub fn new(tier: Tier, store: Box<dyn KeyValueStore>) -> Self {
        Self { tier, store }
    }

    fn decode(&self, key: &str, raw: &str) -> Option<CacheEntry> {
        match serde_json::from_str(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    key,
                    tier = %self.tier,
                    error = %e,
                    "Corrupt cache record, deleting"
                );
                // Best effort; if the substrate also fails the record just
                // stays corrupt and absent.
                let _ = self.store.remove_item(key);
                None
            }
        }
    }

    fn encode(entry: &CacheEntry) -> ForgeResult<String> {
        serde_json::to_string(entry).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl TierBackend for StorageTier {
    fn tier(&self) -> Tier {
        self.tier
    }

    async fn get(&self, key: &str) -> ForgeResult<Option<CacheEntry>> {
        match self.store.get_item(key)? {
            Some(raw) => Ok(self.decode(key, &raw)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> ForgeResult<()> {
        let raw = Self::encode(&entry)?;
        self.store.set_item(key, &raw)
    }

    async fn delete(&self, key: &str) -> ForgeResult<bool> {
        // The substrate surface has no "was present" signal; probe first.
        let present = self.store.get_item(key)?.is_some();
        if present {
            self.store.remove_item(key)?;
        }
        Ok(present)
    }

    async fn clear(&self) -> ForgeResult<u64> {
        let keys = self.store.keys()?;
        let mut removed = 0u64;
        for key in keys {
            self.store.remove_item(&key)?;
            removed += 1;
        }
        Ok(removed)
    }

    async fn keys(&self) -> ForgeResult<Vec<String>> {
        self.store.keys()
    }

    async fn purge_tag(&self, tag: &str) -> ForgeResult<u64> {
        let mut removed = 0u64;
        for key in self.store.keys()? {
            if let Some(raw) = self.store.get_item(&key)? {
                if let Some(entry) = self.decode(&key, &raw) {
                    if entry.has_tag(tag) {
                        self.store.remove_item(&key)?;
                        removed += 1;
                    }
                }
            }
        }
        Ok(removed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> ForgeResult<u64> {
        let mut removed = 0u64;
        for key in self.store.keys()? {
            if let Some(raw) = self.store.get_item(&key)? {
                if let Some(entry) = self.decode(&key, &raw) {
                    if entry.is_expired(now) {
                        self.store.remove_item(&key)?;
                        removed += 1;
                    }
                }
            }
        }
        Ok(removed)
    }
}

// ============================================================================
// IN-MEMORY SUBSTRATE
// ============================================================================

/// In-memory substrate: the default session-tier backing and the unit-test
/// stand-in for a real durable store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> ForgeResult<Option<String>> {
        let items = self.items.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> ForgeResult<()> {
        let mut items = self.items.write().map_err(|_| CacheError::LockPoisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> ForgeResult<()> {
        let mut items = self.items.write().map_err(|_| CacheError::LockPoisoned)?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> ForgeResult<Vec<String>> {
        let items = self.items.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(items.keys().cloned().collect())
    }

    fn item_count(&self) -> ForgeResult<usize> {
        let items = self.items.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(items.len())
    }
}
