//! Promptforge Store - Cached data access
//!
//! The stores in this crate sit between the UI and the backend API.
//! Each one wraps a [`RemoteApi`] implementation with the caching
//! decorators from `promptforge-cache`: reads come from the cache when
//! they can, and mutations invalidate exactly the tags they made stale.
//!
//! Tags are the shared vocabulary between readers and writers, so they
//! are defined once here rather than scattered across the stores.

pub mod models;
pub mod prompts;
pub mod remote;
pub mod stats;

pub use models::{ModelStore, CATALOG_TTL};
pub use prompts::PromptStore;
pub use remote::{MockRemote, RemoteApi};
pub use stats::{StatsStore, STATS_TTL};

/// Tag carried by cached prompt list pages.
pub const TAG_PROMPTS: &str = "prompts";

/// Tag carried by cached single-prompt reads and version history.
pub const TAG_PROMPT_DETAIL: &str = "prompt-detail";

/// Tag carried by the cached model catalog.
pub const TAG_MODELS: &str = "models";

/// Tag carried by cached per-user statistics.
pub const TAG_USER_STATS: &str = "user-stats";
