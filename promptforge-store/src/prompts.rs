//! Cached prompt operations.
//!
//! Reads go through [`Cached`] so repeated page loads and detail views
//! are served locally. Mutations go through [`Evicting`] so every write
//! that succeeds sweeps out the cached reads it made stale. The tag
//! choices are the contract: lists carry [`TAG_PROMPTS`], per-prompt
//! reads carry [`TAG_PROMPT_DETAIL`], and each mutation names the tags
//! it invalidates.

use std::sync::Arc;

use promptforge_cache::{CacheManager, CacheOptions, Cached, Evicting};
use promptforge_core::{
    ModelId, OptimizationOutcome, PageRequest, Prompt, PromptDraft, PromptId, PromptPage,
    PromptPatch, PromptVersion, RemoteError,
};

use crate::remote::RemoteApi;
use crate::{TAG_PROMPTS, TAG_PROMPT_DETAIL, TAG_USER_STATS};

/// Prompt CRUD with read-through caching and write-time invalidation.
pub struct PromptStore<R> {
    api: Arc<R>,
    cache: Arc<CacheManager>,
}

impl<R: RemoteApi + 'static> PromptStore<R> {
    pub fn new(api: Arc<R>, cache: Arc<CacheManager>) -> Self {
        Self { api, cache }
    }

    /// List a page of prompts, cached under the default TTL.
    pub async fn list(&self, page: PageRequest) -> Result<PromptPage, RemoteError> {
        let api = Arc::clone(&self.api);
        Cached::new(
            Arc::clone(&self.cache),
            "prompts.list",
            CacheOptions::new().with_tag(TAG_PROMPTS),
            move |page: PageRequest| {
                let api = Arc::clone(&api);
                async move { api.list_prompts(page).await }
            },
        )
        .call(page)
        .await
    }

    /// Fetch one prompt, cached under the default TTL.
    pub async fn get(&self, prompt_id: PromptId) -> Result<Prompt, RemoteError> {
        let api = Arc::clone(&self.api);
        Cached::new(
            Arc::clone(&self.cache),
            "prompts.get",
            CacheOptions::new().with_tag(TAG_PROMPT_DETAIL),
            move |prompt_id: PromptId| {
                let api = Arc::clone(&api);
                async move { api.get_prompt(prompt_id).await }
            },
        )
        .call(prompt_id)
        .await
    }

    /// Fetch a prompt's version history, cached under the default TTL.
    pub async fn versions(&self, prompt_id: PromptId) -> Result<Vec<PromptVersion>, RemoteError> {
        let api = Arc::clone(&self.api);
        Cached::new(
            Arc::clone(&self.cache),
            "prompts.versions",
            CacheOptions::new().with_tag(TAG_PROMPT_DETAIL),
            move |prompt_id: PromptId| {
                let api = Arc::clone(&api);
                async move { api.list_versions(prompt_id).await }
            },
        )
        .call(prompt_id)
        .await
    }

    /// Create a prompt. Cached lists are invalidated on success.
    pub async fn create(&self, draft: PromptDraft) -> Result<Prompt, RemoteError> {
        let api = Arc::clone(&self.api);
        Evicting::new(
            Arc::clone(&self.cache),
            [TAG_PROMPTS],
            move |draft: PromptDraft| {
                let api = Arc::clone(&api);
                async move { api.create_prompt(draft).await }
            },
        )
        .call(draft)
        .await
    }

    /// Update a prompt. Lists and per-prompt reads are invalidated on
    /// success.
    pub async fn update(
        &self,
        prompt_id: PromptId,
        patch: PromptPatch,
    ) -> Result<Prompt, RemoteError> {
        let api = Arc::clone(&self.api);
        Evicting::new(
            Arc::clone(&self.cache),
            [TAG_PROMPTS, TAG_PROMPT_DETAIL],
            move |(prompt_id, patch): (PromptId, PromptPatch)| {
                let api = Arc::clone(&api);
                async move { api.update_prompt(prompt_id, patch).await }
            },
        )
        .call((prompt_id, patch))
        .await
    }

    /// Delete a prompt. Lists and per-prompt reads are invalidated on
    /// success.
    pub async fn delete(&self, prompt_id: PromptId) -> Result<(), RemoteError> {
        let api = Arc::clone(&self.api);
        Evicting::new(
            Arc::clone(&self.cache),
            [TAG_PROMPTS, TAG_PROMPT_DETAIL],
            move |prompt_id: PromptId| {
                let api = Arc::clone(&api);
                async move { api.delete_prompt(prompt_id).await }
            },
        )
        .call(prompt_id)
        .await
    }

    /// Optimize a prompt for a model. The rewritten body shows up in
    /// lists, detail views and usage stats, so all three are
    /// invalidated on success.
    pub async fn optimize(
        &self,
        prompt_id: PromptId,
        model_id: ModelId,
    ) -> Result<OptimizationOutcome, RemoteError> {
        let api = Arc::clone(&self.api);
        Evicting::new(
            Arc::clone(&self.cache),
            [TAG_PROMPTS, TAG_PROMPT_DETAIL, TAG_USER_STATS],
            move |(prompt_id, model_id): (PromptId, ModelId)| {
                let api = Arc::clone(&api);
                async move { api.optimize_prompt(prompt_id, model_id).await }
            },
        )
        .call((prompt_id, model_id))
        .await
    }
}

impl<R> Clone for PromptStore<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
        }
    }
}
