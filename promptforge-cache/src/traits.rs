//! Backend traits for tiers and durable substrates.
//!
//! Two seams: `TierBackend` is what the manager talks to (one implementation
//! per tier), and `KeyValueStore` is the enumerable string store a durable
//! tier adapts (in-memory map, LMDB, or anything Web-Storage-shaped).

use crate::entry::{CacheEntry, Tier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptforge_core::ForgeResult;
use std::collections::BTreeMap;

/// Storage backend for one cache tier.
///
/// Implementations hold raw entries and never interpret payloads. Expiry
/// policy lives above this trait: the manager decides when an entry read
/// here is stale, while `purge_expired` lets the sweeper evict in bulk.
///
/// Errors returned here never reach cache callers; the manager absorbs
/// them into miss/no-op outcomes and logs.
#[async_trait]
pub trait TierBackend: Send + Sync {
    /// Which tier this backend serves.
    fn tier(&self) -> Tier;

    /// Get the raw entry for a key, expired or not.
    async fn get(&self, key: &str) -> ForgeResult<Option<CacheEntry>>;

    /// Store an entry under a key, replacing any existing entry.
    async fn put(&self, key: &str, entry: CacheEntry) -> ForgeResult<()>;

    /// Delete the entry for a key. Returns whether an entry was present.
    async fn delete(&self, key: &str) -> ForgeResult<bool>;

    /// Remove all entries. Returns how many were removed.
    async fn clear(&self) -> ForgeResult<u64>;

    /// All keys currently present, in unspecified order.
    async fn keys(&self) -> ForgeResult<Vec<String>>;

    /// Delete every entry whose tag set contains `tag`. Returns how many
    /// entries were removed; a tag with no members removes zero.
    async fn purge_tag(&self, tag: &str) -> ForgeResult<u64>;

    /// Delete every entry expired as of `now`. Returns how many entries
    /// were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> ForgeResult<u64>;
}

/// Enumerable string key-value substrate backing a durable tier.
///
/// Mirrors the Web Storage surface (`getItem`/`setItem`/`removeItem` plus
/// enumeration); `keys()` stands in for index-based `key(i)`/`length`
/// iteration, which has no stable meaning under concurrent mutation.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> ForgeResult<Option<String>>;

    /// Store `value` under `key`, replacing any existing value.
    fn set_item(&self, key: &str, value: &str) -> ForgeResult<()>;

    /// Remove the value under `key`. Removing a missing key is a no-op.
    fn remove_item(&self, key: &str) -> ForgeResult<()>;

    /// All keys currently present, in unspecified order.
    fn keys(&self) -> ForgeResult<Vec<String>>;

    /// Number of values currently present.
    fn item_count(&self) -> ForgeResult<usize>;
}

/// A shared substrate handle is itself a substrate.
impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get_item(&self, key: &str) -> ForgeResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> ForgeResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> ForgeResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> ForgeResult<Vec<String>> {
        (**self).keys()
    }

    fn item_count(&self) -> ForgeResult<usize> {
        (**self).item_count()
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Contents of one tier at a point in time.
#[derive(Debug, Clone, Default)]
pub struct TierStats {
    /// Number of entries in the tier.
    pub size: usize,
    /// Keys present in the tier.
    pub keys: Vec<String>,
}

/// Snapshot of cache activity and per-tier contents.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Reads that returned a live entry.
    pub hits: u64,
    /// Reads that found nothing servable (absent, expired, or absorbed
    /// fault).
    pub misses: u64,
    /// Per-tier contents.
    pub tiers: BTreeMap<Tier, TierStats>,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_tier_stats_default_is_empty() {
        let stats = TierStats::default();
        assert_eq!(stats.size, 0);
        assert!(stats.keys.is_empty());
    }
}
