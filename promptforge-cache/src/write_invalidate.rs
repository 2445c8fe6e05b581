//! Write-invalidate wrapper for fallible async mutations.
//!
//! `Evicting` wraps an async function that changes upstream state and
//! couples it to cache invalidation: when the mutation succeeds, every
//! entry carrying one of the configured tags is dropped, so later reads
//! see the change instead of stale cache. When the mutation fails, the
//! cache is left exactly as it was and the error passes through
//! unchanged.

use std::future::Future;
use std::sync::Arc;

use crate::entry::Tier;
use crate::manager::CacheManager;

/// Write-invalidate decorator around an async mutation.
///
/// Invalidation spans all tiers unless narrowed with [`with_tier`]. The
/// broad default exists because a stale copy in any tier defeats the
/// point of invalidating; narrowing is for callers that know exactly
/// where their entries live.
///
/// [`with_tier`]: Evicting::with_tier
///
/// # Example
///
/// ```ignore
/// let update_prompt = Evicting::new(
///     Arc::clone(&cache),
///     ["prompts", "prompt-detail"],
///     move |(id, patch): (PromptId, PromptPatch)| {
///         let api = Arc::clone(&api);
///         async move { api.update_prompt(id, patch).await }
///     },
/// );
///
/// // On success the "prompts" and "prompt-detail" entries are gone.
/// let updated = update_prompt.call((id, patch)).await?;
/// ```
pub struct Evicting<F> {
    cache: Arc<CacheManager>,
    tags: Vec<String>,
    tier: Option<Tier>,
    mutate: F,
}

impl<F> Evicting<F> {
    /// Wrap `mutate` so a successful call invalidates `tags`.
    pub fn new<I, S>(cache: Arc<CacheManager>, tags: I, mutate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cache,
            tags: tags.into_iter().map(Into::into).collect(),
            tier: None,
            mutate,
        }
    }

    /// Restrict invalidation to a single tier.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// The tags invalidated after a successful mutation.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Invoke the mutation, invalidating tagged entries on success.
    ///
    /// The mutation's result is returned as-is in both directions. Cache
    /// faults during invalidation are absorbed by the manager, so they
    /// cannot turn a successful mutation into an error.
    pub async fn call<A, T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = (self.mutate)(args).await?;
        for tag in &self.tags {
            self.cache.clear_by_tag(tag, self.tier).await;
        }
        Ok(value)
    }
}

impl<F: Clone> Clone for Evicting<F> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            tags: self.tags.clone(),
            tier: self.tier,
            mutate: self.mutate.clone(),
        }
    }
}
