//! Cached model catalog.
//!
//! The catalog changes when the backend rolls out model support, not
//! when users act, so it gets a long TTL and lives in the persistent
//! tier where it survives restarts.

use std::sync::Arc;
use std::time::Duration;

use promptforge_cache::{CacheManager, CacheOptions, Cached, Tier};
use promptforge_core::{ModelProfile, RemoteError};

use crate::remote::RemoteApi;
use crate::TAG_MODELS;

/// How long a fetched catalog stays valid.
pub const CATALOG_TTL: Duration = Duration::from_secs(3600);

/// Read side of the model catalog.
pub struct ModelStore<R> {
    api: Arc<R>,
    cache: Arc<CacheManager>,
}

impl<R: RemoteApi + 'static> ModelStore<R> {
    pub fn new(api: Arc<R>, cache: Arc<CacheManager>) -> Self {
        Self { api, cache }
    }

    /// Fetch the model catalog, cached for [`CATALOG_TTL`] in the
    /// persistent tier.
    pub async fn list(&self) -> Result<Vec<ModelProfile>, RemoteError> {
        let api = Arc::clone(&self.api);
        Cached::new(
            Arc::clone(&self.cache),
            "models.list",
            CacheOptions::new()
                .with_tier(Tier::Persistent)
                .with_ttl(CATALOG_TTL)
                .with_tag(TAG_MODELS),
            move |_: ()| {
                let api = Arc::clone(&api);
                async move { api.list_models().await }
            },
        )
        .call(())
        .await
    }

    /// Drop the cached catalog and fetch a fresh one.
    pub async fn refresh(&self) -> Result<Vec<ModelProfile>, RemoteError> {
        self.cache.clear_by_tag(TAG_MODELS, None).await;
        self.list().await
    }
}

impl<R> Clone for ModelStore<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
        }
    }
}
