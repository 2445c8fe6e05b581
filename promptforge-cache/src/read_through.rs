//! Read-through wrapper for fallible async operations.
//!
//! `Cached` wraps an async function so that repeated calls with the same
//! arguments are served from the cache instead of re-running the
//! function. The wrapper never changes the function's error behavior: a
//! failed call propagates its error untouched and caches nothing, and a
//! cache fault downgrades the call to a plain uncached invocation.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::config::CacheOptions;
use crate::keys::{self, KeyFn};
use crate::manager::CacheManager;

/// Read-through decorator around an async fetch function.
///
/// The cache key is derived from the operation name and the serialized
/// call arguments, so distinct arguments get distinct entries. A custom
/// key function can replace the derivation when the default would be too
/// coarse or too fine.
///
/// # Example
///
/// ```ignore
/// let list_prompts = Cached::new(
///     Arc::clone(&cache),
///     "prompts.list",
///     CacheOptions::new().with_tag("prompts"),
///     move |page: PageRequest| {
///         let api = Arc::clone(&api);
///         async move { api.list_prompts(page).await }
///     },
/// );
///
/// let first = list_prompts.call(PageRequest::default()).await?;  // fetches
/// let again = list_prompts.call(PageRequest::default()).await?;  // cached
/// ```
pub struct Cached<F> {
    cache: Arc<CacheManager>,
    op: String,
    options: CacheOptions,
    key_fn: Option<KeyFn>,
    fetch: F,
}

impl<F> Cached<F> {
    /// Wrap `fetch` with read-through caching under `op`.
    pub fn new(
        cache: Arc<CacheManager>,
        op: impl Into<String>,
        options: CacheOptions,
        fetch: F,
    ) -> Self {
        Self {
            cache,
            op: op.into(),
            options,
            key_fn: None,
            fetch,
        }
    }

    /// Replace the default key derivation with a custom function.
    pub fn with_key_fn(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = Some(key_fn);
        self
    }

    /// The operation name used for key derivation.
    pub fn op(&self) -> &str {
        &self.op
    }

    /// The cache options applied to stored results.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Derive the cache key for a set of arguments.
    ///
    /// Returns `None` when the arguments cannot be serialized, which
    /// downgrades the call to an uncached invocation.
    fn cache_key<A: Serialize>(&self, args: &A) -> Option<String> {
        let value = match serde_json::to_value(args) {
            Ok(value) => value,
            Err(err) => {
                warn!(op = %self.op, error = %err, "Could not serialize call arguments, running uncached");
                return None;
            }
        };
        Some(match &self.key_fn {
            Some(custom) => custom(&value),
            None => keys::key_from_value(&self.op, &value),
        })
    }

    /// Invoke the operation, consulting the cache first.
    ///
    /// On a hit the wrapped function is not called at all. On a miss the
    /// function runs; a success is cached under the derived key and a
    /// failure is returned unchanged with nothing cached.
    pub async fn call<A, T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        A: Serialize,
        T: Serialize + DeserializeOwned,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = self.cache_key(&args);

        if let Some(key) = &key {
            if let Some(hit) = self.cache.get::<T>(key, self.options.tier).await {
                return Ok(hit);
            }
        }

        let value = (self.fetch)(args).await?;

        if let Some(key) = &key {
            self.cache.set(key, &value, &self.options).await;
        }

        Ok(value)
    }
}

impl<F: Clone> Clone for Cached<F> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            op: self.op.clone(),
            options: self.options.clone(),
            key_fn: self.key_fn.clone(),
            fetch: self.fetch.clone(),
        }
    }
}
