//! Cache entry model and tier addressing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Storage tier addressed by a cache operation.
///
/// Tiers are independent: the same key may hold different entries in
/// different tiers at the same time, and no operation crosses tiers
/// implicitly. Callers address one tier per call; bulk operations that
/// accept no tier iterate all of them explicitly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// In-process tier, lost when the process exits.
    #[default]
    Memory,
    /// Durable tier that survives across sessions.
    Persistent,
    /// Durable tier scoped to one session; its backing store is cleared
    /// when a new session opens it.
    Session,
}

impl Tier {
    /// All tiers, in sweep order.
    pub const ALL: [Tier; 3] = [Tier::Memory, Tier::Persistent, Tier::Session];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Memory => "memory",
            Tier::Persistent => "persistent",
            Tier::Session => "session",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cached record.
///
/// The payload is opaque JSON; typed values are converted at the manager
/// surface. The serialized form doubles as the durable-tier record layout:
/// `{"data": ..., "storedAt": <epoch ms>, "ttl": <ms>, "tags": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: serde_json::Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub ttl: Duration,
    pub tags: BTreeSet<String>,
}

impl CacheEntry {
    /// Create an entry stamped with the current wall-clock time.
    pub fn new(data: serde_json::Value, ttl: Duration, tags: BTreeSet<String>) -> Self {
        CacheEntry {
            data,
            stored_at: Utc::now(),
            ttl,
            tags,
        }
    }

    /// True once `now - stored_at` strictly exceeds the TTL. An entry read
    /// at exactly TTL age is still served.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        match chrono::TimeDelta::from_std(self.ttl) {
            Ok(ttl) => age > ttl,
            // TTLs beyond chrono's representable range never expire.
            Err(_) => false,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Serde adapter storing a `Duration` as integer milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::json;

    fn tags(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_entry_not_expired_before_ttl() {
        let entry = CacheEntry::new(json!({"n": 1}), Duration::from_secs(60), tags(&[]));
        assert!(!entry.is_expired(Utc::now()));
    }

    #[test]
    fn test_entry_expired_after_ttl() {
        let mut entry = CacheEntry::new(json!("v"), Duration::from_secs(5), tags(&[]));
        entry.stored_at = Utc::now() - TimeDelta::seconds(10);
        assert!(entry.is_expired(Utc::now()));
    }

    #[test]
    fn test_entry_at_exact_ttl_age_is_still_valid() {
        let stored_at = DateTime::from_timestamp_millis(1_700_000_000_000).expect("valid ts");
        let entry = CacheEntry {
            data: json!("v"),
            stored_at,
            ttl: Duration::from_millis(500),
            tags: tags(&[]),
        };
        let at_ttl = stored_at + TimeDelta::milliseconds(500);
        assert!(!entry.is_expired(at_ttl));
        assert!(entry.is_expired(at_ttl + TimeDelta::milliseconds(1)));
    }

    #[test]
    fn test_clock_skew_backwards_never_expires() {
        let entry = CacheEntry::new(json!("v"), Duration::from_millis(1), tags(&[]));
        let past = entry.stored_at - TimeDelta::seconds(30);
        assert!(!entry.is_expired(past));
    }

    #[test]
    fn test_serialized_layout_matches_durable_record() {
        let stored_at = DateTime::from_timestamp_millis(1_700_000_000_123).expect("valid ts");
        let entry = CacheEntry {
            data: json!({"items": [1, 2]}),
            stored_at,
            ttl: Duration::from_millis(300_000),
            tags: tags(&["prompts"]),
        };
        let value = serde_json::to_value(&entry).expect("serialize should succeed");
        assert_eq!(value["storedAt"], json!(1_700_000_000_123i64));
        assert_eq!(value["ttl"], json!(300_000u64));
        assert_eq!(value["tags"], json!(["prompts"]));
        assert_eq!(value["data"], json!({"items": [1, 2]}));
        let object = value.as_object().expect("entry serializes to an object");
        assert_eq!(object.len(), 4);
    }

    #[test]
    fn test_entry_round_trip() {
        let entry = CacheEntry {
            data: json!([{"id": 7, "title": "draft"}]),
            stored_at: DateTime::from_timestamp_millis(1_650_000_000_000).expect("valid ts"),
            ttl: Duration::from_millis(60_000),
            tags: tags(&["prompts", "prompt-detail"]),
        };
        let encoded = serde_json::to_string(&entry).expect("serialize should succeed");
        let decoded: CacheEntry = serde_json::from_str(&encoded).expect("decode should succeed");
        assert_eq!(entry, decoded);
    }

    #[test]
    fn test_tags_collapse_duplicates() {
        let entry = CacheEntry::new(
            json!(null),
            Duration::from_secs(1),
            tags(&["models", "models", "prompts"]),
        );
        assert_eq!(entry.tags.len(), 2);
        assert!(entry.has_tag("models"));
        assert!(entry.has_tag("prompts"));
        assert!(!entry.has_tag("user-stats"));
    }

    #[test]
    fn test_tier_display_names() {
        assert_eq!(Tier::Memory.to_string(), "memory");
        assert_eq!(Tier::Persistent.to_string(), "persistent");
        assert_eq!(Tier::Session.to_string(), "session");
        assert_eq!(Tier::default(), Tier::Memory);
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        fn tag_strategy() -> impl Strategy<Value = BTreeSet<String>> {
            proptest::collection::btree_set("[a-z-]{1,12}", 0..4)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            #[test]
            fn prop_entry_round_trips(
                stored_ms in 0i64..=4_102_444_800_000i64,
                ttl_ms in 0u64..=86_400_000u64,
                payload in "[ -~]{0,64}",
                tags in tag_strategy(),
            ) {
                let entry = CacheEntry {
                    data: serde_json::Value::String(payload),
                    stored_at: DateTime::from_timestamp_millis(stored_ms).expect("in range"),
                    ttl: Duration::from_millis(ttl_ms),
                    tags,
                };
                let encoded = serde_json::to_string(&entry).expect("serialize should succeed");
                let decoded: CacheEntry =
                    serde_json::from_str(&encoded).expect("decode should succeed");
                prop_assert_eq!(entry, decoded);
            }

            #[test]
            fn prop_expiry_is_monotone_in_age(
                ttl_ms in 1u64..=600_000u64,
                age_ms in 0i64..=1_200_000i64,
            ) {
                let stored_at = DateTime::from_timestamp_millis(1_700_000_000_000)
                    .expect("valid ts");
                let entry = CacheEntry {
                    data: serde_json::Value::Null,
                    stored_at,
                    ttl: Duration::from_millis(ttl_ms),
                    tags: BTreeSet::new(),
                };
                let now = stored_at + TimeDelta::milliseconds(age_ms);
                let expired = entry.is_expired(now);
                prop_assert_eq!(expired, age_ms as u64 > ttl_ms);
            }
        }
    }
}
