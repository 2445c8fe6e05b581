//! Remote API abstraction.
//!
//! `RemoteApi` is the seam between the cached stores and the backend.
//! The stores never talk to the network themselves; they wrap whatever
//! implementation they are given, which keeps them testable against
//! [`MockRemote`] and lets the transport change without touching the
//! caching layer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use promptforge_core::{
    new_id, ModelId, ModelProfile, OptimizationOutcome, PageRequest, Prompt, PromptDraft,
    PromptId, PromptPage, PromptPatch, PromptVersion, RemoteError, UserId, UserStats,
};

/// Backend operations the cached stores wrap.
///
/// Every method maps to one backend endpoint. Implementations own their
/// transport and auth; callers only see domain types and
/// [`RemoteError`].
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// List prompts, newest first, one page at a time.
    async fn list_prompts(&self, page: PageRequest) -> Result<PromptPage, RemoteError>;

    /// Fetch a single prompt by id.
    async fn get_prompt(&self, prompt_id: PromptId) -> Result<Prompt, RemoteError>;

    /// Fetch the version history of a prompt, oldest first.
    async fn list_versions(&self, prompt_id: PromptId) -> Result<Vec<PromptVersion>, RemoteError>;

    /// Create a prompt from a draft.
    async fn create_prompt(&self, draft: PromptDraft) -> Result<Prompt, RemoteError>;

    /// Apply a partial update to a prompt.
    async fn update_prompt(
        &self,
        prompt_id: PromptId,
        patch: PromptPatch,
    ) -> Result<Prompt, RemoteError>;

    /// Delete a prompt and its history.
    async fn delete_prompt(&self, prompt_id: PromptId) -> Result<(), RemoteError>;

    /// Run the optimizer against a prompt for a target model.
    async fn optimize_prompt(
        &self,
        prompt_id: PromptId,
        model_id: ModelId,
    ) -> Result<OptimizationOutcome, RemoteError>;

    /// Fetch the catalog of supported models.
    async fn list_models(&self) -> Result<Vec<ModelProfile>, RemoteError>;

    /// Fetch usage statistics for a user.
    async fn user_stats(&self, user_id: UserId) -> Result<UserStats, RemoteError>;
}

// ============================================================================
// MOCK REMOTE
// ============================================================================

/// In-memory mock backend for testing.
///
/// Call counters are public so tests can assert how often the cache let
/// a request through. `set_offline` turns every operation into an
/// `Unavailable` error, which is how tests exercise failure paths.
#[derive(Debug, Default)]
pub struct MockRemote {
    prompts: RwLock<HashMap<PromptId, Prompt>>,
    versions: RwLock<HashMap<PromptId, Vec<PromptVersion>>>,
    models: RwLock<Vec<ModelProfile>>,
    stats: RwLock<HashMap<UserId, UserStats>>,
    offline: AtomicBool,

    /// Attempts against `list_prompts`, including failed ones.
    pub list_calls: AtomicUsize,
    /// Attempts against `get_prompt`.
    pub get_calls: AtomicUsize,
    /// Attempts against `list_versions`.
    pub version_calls: AtomicUsize,
    /// Attempts against `list_models`.
    pub model_calls: AtomicUsize,
    /// Attempts against `user_stats`.
    pub stats_calls: AtomicUsize,
    /// Attempts against any mutating operation.
    pub mutation_calls: AtomicUsize,
}

impl MockRemote {
    /// Create an empty mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a prompt, with a version 1 history entry.
    pub fn insert_prompt(&self, prompt: Prompt) {
        self.versions.write().unwrap().insert(
            prompt.prompt_id,
            vec![PromptVersion {
                prompt_id: prompt.prompt_id,
                version: 1,
                body: prompt.body.clone(),
                optimized: false,
                model_id: None,
                score: None,
                created_at: prompt.created_at,
            }],
        );
        self.prompts.write().unwrap().insert(prompt.prompt_id, prompt);
    }

    /// Seed a model profile.
    pub fn insert_model(&self, profile: ModelProfile) {
        self.models.write().unwrap().push(profile);
    }

    /// Seed statistics for a user.
    pub fn insert_stats(&self, stats: UserStats) {
        self.stats.write().unwrap().insert(stats.user_id, stats);
    }

    /// Toggle simulated outage. While offline every call fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Get count of stored prompts.
    pub fn prompt_count(&self) -> usize {
        self.prompts.read().unwrap().len()
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable {
                reason: "mock remote is offline".to_string(),
            });
        }
        Ok(())
    }

    fn not_found(what: &str, id: impl std::fmt::Display) -> RemoteError {
        RemoteError::NotFound {
            resource: format!("{} {}", what, id),
        }
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn list_prompts(&self, page: PageRequest) -> Result<PromptPage, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;

        let prompts = self.prompts.read().unwrap();
        let mut all: Vec<Prompt> = prompts.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.title.cmp(&b.title)));

        let total = all.len() as u64;
        let start = (page.page.saturating_sub(1) as usize) * page.page_size as usize;
        let items = all
            .into_iter()
            .skip(start)
            .take(page.page_size as usize)
            .collect();

        Ok(PromptPage {
            items,
            page: page.page,
            total,
        })
    }

    async fn get_prompt(&self, prompt_id: PromptId) -> Result<Prompt, RemoteError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;

        self.prompts
            .read()
            .unwrap()
            .get(&prompt_id)
            .cloned()
            .ok_or_else(|| Self::not_found("prompt", prompt_id))
    }

    async fn list_versions(&self, prompt_id: PromptId) -> Result<Vec<PromptVersion>, RemoteError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;

        self.versions
            .read()
            .unwrap()
            .get(&prompt_id)
            .cloned()
            .ok_or_else(|| Self::not_found("prompt", prompt_id))
    }

    async fn create_prompt(&self, draft: PromptDraft) -> Result<Prompt, RemoteError> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;

        let now = Utc::now();
        let prompt = Prompt {
            prompt_id: new_id(),
            owner_id: new_id(),
            title: draft.title,
            body: draft.body,
            target_model: draft.target_model,
            current_version: 1,
            created_at: now,
            updated_at: now,
        };
        self.insert_prompt(prompt.clone());
        Ok(prompt)
    }

    async fn update_prompt(
        &self,
        prompt_id: PromptId,
        patch: PromptPatch,
    ) -> Result<Prompt, RemoteError> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;

        let mut prompts = self.prompts.write().unwrap();
        let prompt = prompts
            .get_mut(&prompt_id)
            .ok_or_else(|| Self::not_found("prompt", prompt_id))?;

        if let Some(title) = patch.title {
            prompt.title = title;
        }
        if let Some(body) = patch.body {
            prompt.body = body.clone();
            prompt.current_version += 1;
            self.versions
                .write()
                .unwrap()
                .entry(prompt_id)
                .or_default()
                .push(PromptVersion {
                    prompt_id,
                    version: prompt.current_version,
                    body,
                    optimized: false,
                    model_id: None,
                    score: None,
                    created_at: Utc::now(),
                });
        }
        if let Some(target_model) = patch.target_model {
            prompt.target_model = Some(target_model);
        }
        prompt.updated_at = Utc::now();

        Ok(prompt.clone())
    }

    async fn delete_prompt(&self, prompt_id: PromptId) -> Result<(), RemoteError> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;

        self.prompts
            .write()
            .unwrap()
            .remove(&prompt_id)
            .ok_or_else(|| Self::not_found("prompt", prompt_id))?;
        self.versions.write().unwrap().remove(&prompt_id);
        Ok(())
    }

    async fn optimize_prompt(
        &self,
        prompt_id: PromptId,
        model_id: ModelId,
    ) -> Result<OptimizationOutcome, RemoteError> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;

        let mut prompts = self.prompts.write().unwrap();
        let prompt = prompts
            .get_mut(&prompt_id)
            .ok_or_else(|| Self::not_found("prompt", prompt_id))?;

        let optimized_body = format!("{} Be specific and concise.", prompt.body);
        prompt.body = optimized_body.clone();
        prompt.current_version += 1;
        prompt.updated_at = Utc::now();

        let outcome = OptimizationOutcome {
            prompt_id,
            version: prompt.current_version,
            optimized_body: optimized_body.clone(),
            score: 0.87,
            model_id: model_id.clone(),
            completed_at: Utc::now(),
        };

        self.versions
            .write()
            .unwrap()
            .entry(prompt_id)
            .or_default()
            .push(PromptVersion {
                prompt_id,
                version: outcome.version,
                body: optimized_body,
                optimized: true,
                model_id: Some(model_id),
                score: Some(outcome.score),
                created_at: outcome.completed_at,
            });

        Ok(outcome)
    }

    async fn list_models(&self) -> Result<Vec<ModelProfile>, RemoteError> {
        self.model_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        Ok(self.models.read().unwrap().clone())
    }

    async fn user_stats(&self, user_id: UserId) -> Result<UserStats, RemoteError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;

        self.stats
            .read()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| Self::not_found("user", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_prompt(title: &str) -> Prompt {
        let now = Utc::now();
        Prompt {
            prompt_id: new_id(),
            owner_id: new_id(),
            title: title.to_string(),
            body: "body".to_string(),
            target_model: None,
            current_version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let remote = MockRemote::new();
        for i in 0..5 {
            remote.insert_prompt(make_prompt(&format!("p{}", i)));
        }

        let page = remote
            .list_prompts(PageRequest::new(1, 2))
            .await
            .expect("list should succeed");
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);

        let last = remote
            .list_prompts(PageRequest::new(3, 2))
            .await
            .expect("list should succeed");
        assert_eq!(last.items.len(), 1);
    }

    #[tokio::test]
    async fn test_update_body_bumps_version() {
        let remote = MockRemote::new();
        let prompt = make_prompt("p");
        remote.insert_prompt(prompt.clone());

        let patch = PromptPatch {
            title: None,
            body: Some("new body".to_string()),
            target_model: None,
        };
        let updated = remote
            .update_prompt(prompt.prompt_id, patch)
            .await
            .expect("update should succeed");

        assert_eq!(updated.current_version, 2);
        let versions = remote
            .list_versions(prompt.prompt_id)
            .await
            .expect("versions should succeed");
        assert_eq!(versions.len(), 2);
    }

    #[tokio::test]
    async fn test_optimize_records_scored_version() {
        let remote = MockRemote::new();
        let prompt = make_prompt("p");
        remote.insert_prompt(prompt.clone());

        let outcome = remote
            .optimize_prompt(prompt.prompt_id, "gpt-4o".to_string())
            .await
            .expect("optimize should succeed");
        assert_eq!(outcome.version, 2);

        let versions = remote
            .list_versions(prompt.prompt_id)
            .await
            .expect("versions should succeed");
        let latest = versions.last().expect("latest version should exist");
        assert!(latest.optimized);
        assert_eq!(latest.score, Some(outcome.score));
    }

    #[tokio::test]
    async fn test_offline_fails_everything() {
        let remote = MockRemote::new();
        remote.set_offline(true);

        let result = remote.list_prompts(PageRequest::default()).await;
        assert!(matches!(result, Err(RemoteError::Unavailable { .. })));
        assert_eq!(remote.list_calls.load(Ordering::SeqCst), 1);

        remote.set_offline(false);
        remote
            .list_prompts(PageRequest::default())
            .await
            .expect("list should succeed once back online");
    }

    #[tokio::test]
    async fn test_missing_prompt_is_not_found() {
        let remote = MockRemote::new();
        let result = remote.get_prompt(new_id()).await;
        assert!(matches!(result, Err(RemoteError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_history() {
        let remote = MockRemote::new();
        let prompt = make_prompt("p");
        remote.insert_prompt(prompt.clone());

        remote
            .delete_prompt(prompt.prompt_id)
            .await
            .expect("delete should succeed");
        assert_eq!(remote.prompt_count(), 0);
        let versions = remote.list_versions(prompt.prompt_id).await;
        assert!(matches!(versions, Err(RemoteError::NotFound { .. })));
    }
}
