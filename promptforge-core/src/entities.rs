//! Domain entities exchanged with the remote API and cached by the data layer.
//!
//! These are payload types: the cache treats all of them as opaque JSON.

use crate::{ModelId, PromptId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

// ============================================================================
// PROMPTS
// ============================================================================

/// A user-authored prompt with its current optimized body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub prompt_id: PromptId,
    pub owner_id: UserId,
    pub title: String,
    pub body: String,
    /// Model the prompt was last optimized for, if any.
    pub target_model: Option<ModelId>,
    pub current_version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One revision in a prompt's history. Version numbers start at 1 and only
/// grow; optimized revisions carry the model that produced them and a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    pub prompt_id: PromptId,
    pub version: i32,
    pub body: String,
    pub optimized: bool,
    pub model_id: Option<ModelId>,
    pub score: Option<f32>,
    pub created_at: Timestamp,
}

/// Fields for creating a new prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDraft {
    pub title: String,
    pub body: String,
    pub target_model: Option<ModelId>,
}

/// Partial update of a prompt. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub target_model: Option<ModelId>,
}

impl PromptPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.target_model.is_none()
    }
}

// ============================================================================
// OPTIMIZATION
// ============================================================================

/// Result object returned by the remote optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub prompt_id: PromptId,
    /// Version created for the optimized body.
    pub version: i32,
    pub optimized_body: String,
    /// Provider-reported quality score in [0, 1].
    pub score: f32,
    pub model_id: ModelId,
    pub completed_at: Timestamp,
}

// ============================================================================
// MODELS AND STATS
// ============================================================================

/// A target model the optimizer supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model_id: ModelId,
    pub display_name: String,
    pub provider: String,
    pub context_window: i32,
    pub supports_optimization: bool,
}

/// Per-user usage summary shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: UserId,
    pub prompt_count: i64,
    pub optimization_count: i64,
    /// Mean score improvement across optimizations, in [0, 1].
    pub avg_improvement: f32,
    pub last_active: Timestamp,
}

// ============================================================================
// PAGING
// ============================================================================

/// A page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            page_size: 20,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        PageRequest { page, page_size }
    }
}

/// One page of prompts plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPage {
    pub items: Vec<Prompt>,
    pub page: u32,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_id;
    use chrono::Utc;

    fn make_prompt() -> Prompt {
        Prompt {
            prompt_id: new_id(),
            owner_id: new_id(),
            title: "Summarize meeting notes".to_string(),
            body: "Summarize the following notes".to_string(),
            target_model: Some("gpt-4o-mini".to_string()),
            current_version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_serde_round_trip() {
        let prompt = make_prompt();
        let json = serde_json::to_string(&prompt).expect("serialize should succeed");
        let back: Prompt = serde_json::from_str(&json).expect("deserialize should succeed");
        assert_eq!(prompt, back);
    }

    #[test]
    fn test_prompt_patch_is_empty() {
        assert!(PromptPatch::default().is_empty());
        let patch = PromptPatch {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_page_request_default() {
        let page = PageRequest::default();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 20);
    }
}
