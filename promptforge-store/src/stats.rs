//! Cached per-user statistics.
//!
//! Stats move with every optimization run, so the TTL is short. The
//! default derived key would work, but a hashed UUID makes terrible log
//! reading; a custom key function keeps the user id visible in stats
//! output and cache dumps.

use std::sync::Arc;
use std::time::Duration;

use promptforge_cache::{CacheManager, CacheOptions, Cached};
use promptforge_core::{RemoteError, UserId, UserStats};

use crate::remote::RemoteApi;
use crate::TAG_USER_STATS;

/// How long fetched statistics stay valid.
pub const STATS_TTL: Duration = Duration::from_secs(60);

/// Read side of per-user usage statistics.
pub struct StatsStore<R> {
    api: Arc<R>,
    cache: Arc<CacheManager>,
}

impl<R: RemoteApi + 'static> StatsStore<R> {
    pub fn new(api: Arc<R>, cache: Arc<CacheManager>) -> Self {
        Self { api, cache }
    }

    /// Fetch usage statistics for a user, cached for [`STATS_TTL`].
    pub async fn for_user(&self, user_id: UserId) -> Result<UserStats, RemoteError> {
        let api = Arc::clone(&self.api);
        Cached::new(
            Arc::clone(&self.cache),
            "stats.user",
            CacheOptions::new()
                .with_ttl(STATS_TTL)
                .with_tag(TAG_USER_STATS),
            move |user_id: UserId| {
                let api = Arc::clone(&api);
                async move { api.user_stats(user_id).await }
            },
        )
        .with_key_fn(Arc::new(|args: &serde_json::Value| {
            // A UUID serializes to a JSON string; strip the quotes so
            // the key reads as "stats.user:<uuid>".
            format!("stats.user:{}", args.as_str().unwrap_or("unknown"))
        }))
        .call(user_id)
        .await
    }
}

impl<R> Clone for StatsStore<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
        }
    }
}
