//! Promptforge Test Utilities
//!
//! Centralized test infrastructure for the Promptforge workspace:
//! - Proptest strategies for the core entity types
//! - Pre-built fixtures for common scenarios

// Re-export core types for convenience
pub use promptforge_core::{
    new_id, ModelId, ModelProfile, OptimizationOutcome, PageRequest, Prompt, PromptDraft,
    PromptId, PromptPage, PromptPatch, PromptVersion, Timestamp, UserId, UserStats,
};

use chrono::Utc;
use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Promptforge entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a Timestamp within a reasonable range (2020-2030).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a short printable title.
    pub fn arb_title() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ]{1,40}"
    }

    /// Generate a prompt body with a few lines of text.
    pub fn arb_body() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .,\\n]{1,200}"
    }

    /// Generate an optional model identifier.
    pub fn arb_target_model() -> impl Strategy<Value = Option<ModelId>> {
        prop::option::of("[a-z0-9-]{3,20}".prop_map(String::from))
    }

    /// Generate a complete Prompt.
    pub fn arb_prompt() -> impl Strategy<Value = Prompt> {
        (
            arb_uuid(),
            arb_uuid(),
            arb_title(),
            arb_body(),
            arb_target_model(),
            1i32..100,
            arb_timestamp(),
        )
            .prop_map(
                |(prompt_id, owner_id, title, body, target_model, version, created_at)| Prompt {
                    prompt_id,
                    owner_id,
                    title,
                    body,
                    target_model,
                    current_version: version,
                    created_at,
                    updated_at: created_at,
                },
            )
    }

    /// Generate a PromptDraft.
    pub fn arb_draft() -> impl Strategy<Value = PromptDraft> {
        (arb_title(), arb_body(), arb_target_model()).prop_map(
            |(title, body, target_model)| PromptDraft {
                title,
                body,
                target_model,
            },
        )
    }

    /// Generate a PageRequest with sane bounds.
    pub fn arb_page_request() -> impl Strategy<Value = PageRequest> {
        (1u32..50, 1u32..100).prop_map(|(page, page_size)| PageRequest { page, page_size })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Create a test Prompt with the given title.
    pub fn test_prompt(title: &str) -> Prompt {
        test_prompt_for(new_id(), title)
    }

    /// Create a test Prompt owned by a specific user.
    pub fn test_prompt_for(owner_id: UserId, title: &str) -> Prompt {
        let now = Utc::now();
        Prompt {
            prompt_id: new_id(),
            owner_id,
            title: title.to_string(),
            body: "Summarize the following document in three bullet points.".to_string(),
            target_model: Some("gpt-4o".to_string()),
            current_version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a test PromptVersion for a given prompt.
    pub fn test_version(prompt_id: PromptId, version: i32) -> PromptVersion {
        PromptVersion {
            prompt_id,
            version,
            body: format!("Prompt body at version {}", version),
            optimized: version > 1,
            model_id: Some("gpt-4o".to_string()),
            score: if version > 1 { Some(0.82) } else { None },
            created_at: Utc::now(),
        }
    }

    /// Create a test PromptDraft.
    pub fn test_draft() -> PromptDraft {
        PromptDraft {
            title: "New prompt".to_string(),
            body: "Explain this code to a junior engineer.".to_string(),
            target_model: None,
        }
    }

    /// Create a PromptPatch that only changes the body.
    pub fn test_patch(body: &str) -> PromptPatch {
        PromptPatch {
            title: None,
            body: Some(body.to_string()),
            target_model: None,
        }
    }

    /// Create a test ModelProfile.
    pub fn test_profile(model_id: &str) -> ModelProfile {
        ModelProfile {
            model_id: model_id.to_string(),
            display_name: format!("Model {}", model_id),
            provider: "openai".to_string(),
            context_window: 128_000,
            supports_optimization: true,
        }
    }

    /// Create test UserStats for a given user.
    pub fn test_stats(user_id: UserId) -> UserStats {
        UserStats {
            user_id,
            prompt_count: 12,
            optimization_count: 5,
            avg_improvement: 0.31,
            last_active: Utc::now(),
        }
    }

    /// Create a test OptimizationOutcome for a given prompt.
    pub fn test_outcome(prompt_id: PromptId) -> OptimizationOutcome {
        OptimizationOutcome {
            prompt_id,
            version: 2,
            optimized_body: "Summarize the document below as three concise bullets.".to_string(),
            score: 0.87,
            model_id: "gpt-4o".to_string(),
            completed_at: Utc::now(),
        }
    }

    /// Create a single-page PromptPage from a list of prompts.
    pub fn test_page(items: Vec<Prompt>) -> PromptPage {
        let total = items.len() as u64;
        PromptPage {
            items,
            page: 1,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::generators::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixture_prompt_is_consistent() {
        let prompt = test_prompt("Greeting");
        assert_eq!(prompt.title, "Greeting");
        assert_eq!(prompt.current_version, 1);
        assert_eq!(prompt.created_at, prompt.updated_at);
    }

    #[test]
    fn test_fixture_page_counts_items() {
        let page = test_page(vec![test_prompt("a"), test_prompt("b")]);
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_fixture_version_marks_optimized() {
        let id = new_id();
        assert!(!test_version(id, 1).optimized);
        assert!(test_version(id, 2).optimized);
    }

    proptest! {
        #[test]
        fn prop_arb_prompt_serializes(prompt in arb_prompt()) {
            let json = serde_json::to_string(&prompt).expect("serialize should succeed");
            let back: Prompt = serde_json::from_str(&json).expect("deserialize should succeed");
            prop_assert_eq!(prompt, back);
        }

        #[test]
        fn prop_arb_page_request_in_bounds(req in arb_page_request()) {
            prop_assert!(req.page >= 1);
            prop_assert!(req.page_size >= 1);
        }
    }
}
