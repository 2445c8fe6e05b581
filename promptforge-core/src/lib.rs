//! Promptforge Core - Identity Types and Entities
//!
//! Pure data structures shared by the cache layer and the store facades.
//! This crate contains data types and the error taxonomy - no business logic.

use uuid::Uuid;

pub mod entities;
pub mod error;

pub use entities::{
    ModelProfile, OptimizationOutcome, PageRequest, Prompt, PromptDraft, PromptPage, PromptPatch,
    PromptVersion, UserStats,
};
pub use error::{CacheError, ForgeError, ForgeResult, RemoteError};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Prompt identifier using UUIDv7 for timestamp-sortable IDs.
pub type PromptId = Uuid;

/// User identifier.
pub type UserId = Uuid;

/// Model identifier as published by the provider (e.g. "gpt-4o-mini").
pub type ModelId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a new UUIDv7 identifier (timestamp-sortable).
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}
