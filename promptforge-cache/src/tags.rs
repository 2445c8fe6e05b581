//! Reverse index from tag to the keys carrying it.

use std::collections::{BTreeSet, HashMap, HashSet};

/// Materialized reverse index for one tier: tag -> set of keys.
///
/// The entry map is the source of truth; the index must be updated in the
/// same logical step as every insert and removal so it never reports a key
/// whose entry is gone. `MemoryTier` keeps both behind one lock for exactly
/// that reason. Durable tiers skip the index and scan instead, which stays
/// correct across process restarts.
#[derive(Debug, Default)]
pub struct TagIndex {
    by_tag: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as carrying each tag in `tags`.
    pub fn insert(&mut self, key: &str, tags: &BTreeSet<String>) {
        for tag in tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    /// Remove `key`'s membership for each tag in `tags`.
    ///
    /// Call with the full tag set of the entry being removed, whatever the
    /// removal reason, so an entry tagged `{a, b}` purged via `a` also
    /// leaves `b`'s key set.
    pub fn remove(&mut self, key: &str, tags: &BTreeSet<String>) {
        for tag in tags {
            if let Some(keys) = self.by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    /// Keys currently carrying `tag`, in unspecified order.
    pub fn keys_for(&self, tag: &str) -> Vec<String> {
        self.by_tag
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop all memberships.
    pub fn clear(&mut self) {
        self.by_tag.clear();
    }

    /// Number of distinct tags with at least one member.
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}
