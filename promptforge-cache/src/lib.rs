//! Promptforge Cache - Tiered client-side caching
//!
//! This crate keeps remote reads fast and remote writes honest. Values
//! live in one of three independent tiers: a process-local memory tier,
//! a persistent tier that survives restarts, and a session tier that is
//! wiped every time the process starts. Every entry carries a TTL and a
//! set of tags, so data ages out on its own and mutations can sweep out
//! everything a change made stale.
//!
//! # Design Philosophy
//!
//! The cache is an accelerator, never a source of failures. Any internal
//! fault degrades to the uncached behavior: a failed read is a miss, a
//! failed write is a no-op, and corrupt entries are deleted on sight.
//! Callers only ever see errors from their own operations, which the
//! [`Cached`] and [`Evicting`] wrappers pass through untouched.
//!
//! # Example
//!
//! ```ignore
//! use promptforge_cache::{CacheConfig, CacheManager, CacheOptions, Cached, SweeperHandle, Tier};
//! use std::sync::Arc;
//!
//! let cache = Arc::new(CacheManager::with_lmdb("/var/lib/promptforge", 64, CacheConfig::from_env())?);
//! let sweeper = SweeperHandle::spawn(Arc::clone(&cache));
//!
//! let list_prompts = Cached::new(
//!     Arc::clone(&cache),
//!     "prompts.list",
//!     CacheOptions::new().with_tag("prompts"),
//!     move |page| { let api = Arc::clone(&api); async move { api.list_prompts(page).await } },
//! );
//!
//! let prompts = list_prompts.call(PageRequest::default()).await?;
//! ```

pub mod config;
pub mod durable;
pub mod entry;
pub mod keys;
pub mod lmdb;
pub mod manager;
pub mod memory;
pub mod read_through;
pub mod sweeper;
pub mod tags;
pub mod traits;
pub mod write_invalidate;

pub use config::{CacheConfig, CacheOptions, DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TTL_SECS};
pub use durable::{MemoryStore, StorageTier};
pub use entry::{CacheEntry, Tier};
pub use keys::{derive_key, key_from_value, KeyFn};
pub use lmdb::{LmdbStore, LmdbStoreError, PERSISTENT_DB, SESSION_DB};
pub use manager::CacheManager;
pub use memory::MemoryTier;
pub use read_through::Cached;
pub use sweeper::{sweep_task, SweeperHandle, SweeperMetrics, SweeperSnapshot};
pub use tags::TagIndex;
pub use traits::{CacheStats, KeyValueStore, TierBackend, TierStats};
pub use write_invalidate::Evicting;

// Re-export the error types callers match on.
pub use promptforge_core::{CacheError, ForgeError, ForgeResult};
