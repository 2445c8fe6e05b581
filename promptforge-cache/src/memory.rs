//! In-process memory tier.

use crate::entry::{CacheEntry, Tier};
use crate::tags::TagIndex;
use crate::traits::TierBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptforge_core::{CacheError, ForgeResult};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, CacheEntry>,
    index: TagIndex,
}

/// Memory tier: the entry map and its tag index share one lock, so every
/// mutation updates both in a single atomic step and the index can never
/// report a key whose entry is gone.
#[derive(Debug, Default)]
pub struct MemoryTier {
    inner: RwLock<MemoryInner>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TierBackend for MemoryTier {
    fn tier(&self) -> Tier {
        Tier::Memory
    }

    async fn get(&self, key: &str) -> ForgeResult<Option<CacheEntry>> {
        let inner = self.inner.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(inner.entries.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> ForgeResult<()> {
        let mut inner = self.inner.write().map_err(|_| CacheError::LockPoisoned)?;
        if let Some(old) = inner.entries.remove(key) {
            inner.index.remove(key, &old.tags);
        }
        inner.index.insert(key, &entry.tags);
        inner.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ForgeResult<bool> {
        let mut inner = self.inner.write().map_err(|_| CacheError::LockPoisoned)?;
        match inner.entries.remove(key) {
            Some(old) => {
                inner.index.remove(key, &old.tags);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear(&self) -> ForgeResult<u64> {
        let mut inner = self.inner.write().map_err(|_| CacheError::LockPoisoned)?;
        let removed = inner.entries.len() as u64;
        inner.entries.clear();
        inner.index.clear();
        Ok(removed)
    }

    async fn keys(&self) -> ForgeResult<Vec<String>> {
        let inner = self.inner.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(inner.entries.keys().cloned().collect())
    }

    async fn purge_tag(&self, tag: &str) -> ForgeResult<u64> {
        let mut inner = self.inner.write().map_err(|_| CacheError::LockPoisoned)?;
        let keys = inner.index.keys_for(tag);
        let mut removed = 0u64;
        for key in keys {
            if let Some(old) = inner.entries.remove(&key) {
                inner.index.remove(&key, &old.tags);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> ForgeResult<u64> {
        let mut inner = self.inner.write().map_err(|_| CacheError::LockPoisoned)?;
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        let mut removed = 0u64;
        for key in &expired {
            if let Some(old) = inner.entries.remove(key) {
                inner.index.remove(key, &old.tags);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn tags(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn make_entry(value: serde_json::Value, tag_names: &[&str]) -> CacheEntry {
        CacheEntry::new(value, Duration::from_secs(60), tags(tag_names))
    }

    fn index_members(tier: &MemoryTier, tag: &str) -> Vec<String> {
        let mut keys = tier.inner.read().expect("lock").index.keys_for(tag);
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let tier = MemoryTier::new();
        let entry = make_entry(json!({"items": [1, 2]}), &["prompts"]);
        tier.put("prompts:list:p1", entry.clone())
            .await
            .expect("put should succeed");

        let got = tier
            .get("prompts:list:p1")
            .await
            .expect("get should succeed")
            .expect("entry should exist");
        assert_eq!(got, entry);
        assert_eq!(tier.keys().await.expect("keys").len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let tier = MemoryTier::new();
        let got = tier.get("absent").await.expect("get should succeed");
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_and_reindexes() {
        let tier = MemoryTier::new();
        tier.put("k", make_entry(json!(1), &["old-tag"]))
            .await
            .expect("put");
        tier.put("k", make_entry(json!(2), &["new-tag"]))
            .await
            .expect("put");

        let got = tier.get("k").await.expect("get").expect("entry");
        assert_eq!(got.data, json!(2));
        assert!(index_members(&tier, "old-tag").is_empty());
        assert_eq!(index_members(&tier, "new-tag"), vec!["k"]);
        assert_eq!(tier.keys().await.expect("keys").len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cleans_index() {
        let tier = MemoryTier::new();
        tier.put("k", make_entry(json!("v"), &["prompts"]))
            .await
            .expect("put");

        assert!(tier.delete("k").await.expect("delete"));
        assert!(!tier.delete("k").await.expect("second delete"));
        assert!(tier.get("k").await.expect("get").is_none());
        assert!(index_members(&tier, "prompts").is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let tier = MemoryTier::new();
        tier.put("a", make_entry(json!(1), &["x"])).await.expect("put");
        tier.put("b", make_entry(json!(2), &["y"])).await.expect("put");

        assert_eq!(tier.clear().await.expect("clear"), 2);
        assert!(tier.keys().await.expect("keys").is_empty());
        assert!(index_members(&tier, "x").is_empty());
        assert!(index_members(&tier, "y").is_empty());
    }

    #[tokio::test]
    async fn test_purge_tag_removes_only_tagged() {
        let tier = MemoryTier::new();
        tier.put("p1", make_entry(json!(1), &["prompts"])).await.expect("put");
        tier.put("p2", make_entry(json!(2), &["prompts"])).await.expect("put");
        tier.put("m", make_entry(json!(3), &["models"])).await.expect("put");

        assert_eq!(tier.purge_tag("prompts").await.expect("purge"), 2);
        assert!(tier.get("p1").await.expect("get").is_none());
        assert!(tier.get("p2").await.expect("get").is_none());
        assert!(tier.get("m").await.expect("get").is_some());

        // Idempotent: nothing left to purge.
        assert_eq!(tier.purge_tag("prompts").await.expect("purge"), 0);
    }

    #[tokio::test]
    async fn test_purge_tag_or_semantics() {
        let tier = MemoryTier::new();
        tier.put("detail", make_entry(json!(1), &["prompts", "prompt-detail"]))
            .await
            .expect("put");

        // Purging either tag removes the whole entry and both memberships.
        assert_eq!(tier.purge_tag("prompt-detail").await.expect("purge"), 1);
        assert!(tier.get("detail").await.expect("get").is_none());
        assert!(index_members(&tier, "prompts").is_empty());
        assert!(index_members(&tier, "prompt-detail").is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_removes_only_stale() {
        let tier = MemoryTier::new();
        let mut stale = make_entry(json!("old"), &["prompts"]);
        stale.stored_at = Utc::now() - TimeDelta::seconds(120);
        stale.ttl = Duration::from_secs(30);
        tier.put("stale", stale).await.expect("put");
        tier.put("fresh", make_entry(json!("new"), &["prompts"]))
            .await
            .expect("put");

        assert_eq!(tier.purge_expired(Utc::now()).await.expect("purge"), 1);
        assert!(tier.get("stale").await.expect("get").is_none());
        assert!(tier.get("fresh").await.expect("get").is_some());
        assert_eq!(index_members(&tier, "prompts"), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_keys_lists_current_entries() {
        let tier = MemoryTier::new();
        tier.put("a", make_entry(json!(1), &[])).await.expect("put");
        tier.put("b", make_entry(json!(2), &[])).await.expect("put");
        let mut keys = tier.keys().await.expect("keys");
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
