//! Tiered cache coordinator.
//!
//! `CacheManager` routes reads and writes to one of three tiers (memory,
//! persistent, session) and enforces the crate's failure contract: cache
//! faults never surface to callers. A failed write is a no-op, a failed
//! read is a miss, and a corrupt or expired entry is removed on the read
//! path. Everything is logged through `tracing` so operators still see
//! the faults that callers never do.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{CacheConfig, CacheOptions};
use crate::durable::{MemoryStore, StorageTier};
use crate::entry::{CacheEntry, Tier};
use crate::lmdb::{LmdbStore, LmdbStoreError, PERSISTENT_DB, SESSION_DB};
use crate::memory::MemoryTier;
use crate::traits::{CacheStats, TierBackend, TierStats};

/// Coordinator over the three cache tiers.
///
/// Each tier is an independent key space: the same key may hold different
/// values in different tiers, and operations name the tier they act on.
/// All backends are injected, so tests can swap in failing or instrumented
/// implementations without touching the routing logic.
pub struct CacheManager {
    memory: Arc<dyn TierBackend>,
    persistent: Arc<dyn TierBackend>,
    session: Arc<dyn TierBackend>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheManager {
    /// Create a manager from explicit tier backends.
    pub fn new(
        memory: Arc<dyn TierBackend>,
        persistent: Arc<dyn TierBackend>,
        session: Arc<dyn TierBackend>,
        config: CacheConfig,
    ) -> Self {
        Self {
            memory,
            persistent,
            session,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a manager with all three tiers held in process memory.
    ///
    /// The persistent and session tiers are backed by in-memory key-value
    /// stores, so nothing actually survives a restart. This is the right
    /// constructor for tests and for deployments that have no durable
    /// substrate available.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(
            Arc::new(MemoryTier::new()),
            Arc::new(StorageTier::new(
                Tier::Persistent,
                Box::new(MemoryStore::new()),
            )),
            Arc::new(StorageTier::new(Tier::Session, Box::new(MemoryStore::new()))),
            config,
        )
    }

    /// Create a manager whose durable tiers live in an LMDB environment at
    /// `path`.
    ///
    /// The persistent database keeps whatever previous processes stored.
    /// The session database is wiped as part of opening, which is what
    /// scopes its contents to the lifetime of this process.
    pub fn with_lmdb<P: AsRef<Path>>(
        path: P,
        max_size_mb: usize,
        config: CacheConfig,
    ) -> Result<Self, LmdbStoreError> {
        let env = LmdbStore::open_env(path, max_size_mb)?;
        let persistent = LmdbStore::create(&env, PERSISTENT_DB)?;
        let session = LmdbStore::create_cleared(&env, SESSION_DB)?;
        Ok(Self::new(
            Arc::new(MemoryTier::new()),
            Arc::new(StorageTier::new(Tier::Persistent, Box::new(persistent))),
            Arc::new(StorageTier::new(Tier::Session, Box::new(session))),
            config,
        ))
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn backend(&self, tier: Tier) -> &Arc<dyn TierBackend> {
        match tier {
            Tier::Memory => &self.memory,
            Tier::Persistent => &self.persistent,
            Tier::Session => &self.session,
        }
    }

    /// Tiers covered by an operation: one when named, all when not.
    fn scope(tier: Option<Tier>) -> Vec<Tier> {
        match tier {
            Some(t) => vec![t],
            None => Tier::ALL.to_vec(),
        }
    }

    /// Read a value from one tier.
    ///
    /// Returns `None` on a genuine miss, but also when the entry has
    /// expired, when it cannot be decoded into `T`, or when the tier
    /// itself fails. Expired and undecodable entries are removed so the
    /// next read does not trip over them again.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, tier: Tier) -> Option<T> {
        let entry = match self.backend(tier).get(key).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%key, %tier, error = %err, "Cache read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let Some(entry) = entry else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if entry.is_expired(Utc::now()) {
            debug!(%key, %tier, "Lazy-expiring stale entry");
            self.remove_quietly(key, tier).await;
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Err(err) => {
                warn!(%key, %tier, error = %err, "Cached value does not match requested type, dropping");
                self.remove_quietly(key, tier).await;
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Write a value into the tier named by `options`.
    ///
    /// Overwrites any existing entry under the same key in that tier.
    /// Serialization and backend failures are logged and swallowed, so a
    /// failed write leaves the cache as it was.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, options: &CacheOptions) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(err) => {
                warn!(%key, error = %err, "Cache write failed, value not serializable");
                return;
            }
        };

        let ttl = options.ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry::new(data, ttl, options.tags.clone());

        if let Err(err) = self.backend(options.tier).put(key, entry).await {
            warn!(%key, tier = %options.tier, error = %err, "Cache write failed, entry not persisted");
        }
    }

    /// Remove a key from one tier. Returns whether an entry was present.
    pub async fn delete(&self, key: &str, tier: Tier) -> bool {
        match self.backend(tier).delete(key).await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(%key, %tier, error = %err, "Cache delete failed");
                false
            }
        }
    }

    /// Drop every entry in the given tier, or in all tiers when `None`.
    /// Returns the number of entries removed.
    pub async fn clear(&self, tier: Option<Tier>) -> u64 {
        let mut removed = 0;
        for tier in Self::scope(tier) {
            match self.backend(tier).clear().await {
                Ok(count) => removed += count,
                Err(err) => {
                    warn!(%tier, error = %err, "Cache clear failed for tier, continuing");
                }
            }
        }
        removed
    }

    /// Remove every entry carrying `tag` from the given tier, or from all
    /// tiers when `None`. Returns the number of entries removed. Unknown
    /// tags are a no-op, so repeating an invalidation is harmless.
    pub async fn clear_by_tag(&self, tag: &str, tier: Option<Tier>) -> u64 {
        let mut removed = 0;
        for tier in Self::scope(tier) {
            match self.backend(tier).purge_tag(tag).await {
                Ok(count) => {
                    if count > 0 {
                        debug!(%tag, %tier, count, "Invalidated tagged entries");
                    }
                    removed += count;
                }
                Err(err) => {
                    warn!(%tag, %tier, error = %err, "Tag invalidation failed for tier, continuing");
                }
            }
        }
        removed
    }

    /// Remove expired entries from every tier. Returns the number removed.
    ///
    /// A tier failure is logged and skipped so one bad tier cannot stop
    /// the others from being swept.
    pub async fn clear_expired(&self) -> u64 {
        let now = Utc::now();
        let mut removed = 0;
        for tier in Tier::ALL {
            match self.backend(tier).purge_expired(now).await {
                Ok(count) => removed += count,
                Err(err) => {
                    warn!(%tier, error = %err, "Expiry sweep failed for tier, continuing");
                }
            }
        }
        removed
    }

    /// Snapshot per-tier sizes and key lists along with hit/miss counters.
    ///
    /// A tier that cannot enumerate its keys reports as empty rather than
    /// failing the whole snapshot.
    pub async fn stats(&self) -> CacheStats {
        let mut tiers = BTreeMap::new();
        for tier in Tier::ALL {
            let keys = match self.backend(tier).keys().await {
                Ok(keys) => keys,
                Err(err) => {
                    debug!(%tier, error = %err, "Key enumeration failed, reporting tier as empty");
                    Vec::new()
                }
            };
            tiers.insert(
                tier,
                TierStats {
                    size: keys.len(),
                    keys,
                },
            );
        }
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            tiers,
        }
    }

    /// Best-effort removal used on the read path for expired or corrupt
    /// entries. Failures are logged at debug level only.
    async fn remove_quietly(&self, key: &str, tier: Tier) {
        if let Err(err) = self.backend(tier).delete(key).await {
            debug!(%key, %tier, error = %err, "Failed to drop stale entry");
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
