//! Cache configuration and per-write options.

use crate::entry::Tier;
use std::collections::BTreeSet;
use std::time::Duration;

/// TTL applied to writes that specify none: 5 minutes.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Default sweep period: 60 seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

// ============================================================================
// MANAGER CONFIGURATION
// ============================================================================

/// Configuration for a `CacheManager` and its expiry sweeper.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL used by writes that do not specify one (default: 5 minutes)
    pub default_ttl: Duration,

    /// How often the sweeper evicts expired entries (default: 60 seconds)
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from environment variables.
    ///
    /// # Environment Variables
    /// - `PROMPTFORGE_CACHE_DEFAULT_TTL_SECS`: default entry TTL (default: 300)
    /// - `PROMPTFORGE_CACHE_SWEEP_INTERVAL_SECS`: sweep period (default: 60)
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let default_ttl = Duration::from_secs(
            std::env::var("PROMPTFORGE_CACHE_DEFAULT_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TTL_SECS),
        );

        let sweep_interval = Duration::from_secs(
            std::env::var("PROMPTFORGE_CACHE_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        );

        Self {
            default_ttl,
            sweep_interval,
        }
    }

    /// Configuration for development and tests: short TTLs, fast sweeps.
    pub fn development() -> Self {
        Self {
            default_ttl: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(5),
        }
    }

    /// Configuration for production: the standard defaults.
    pub fn production() -> Self {
        Self::default()
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the sweep period.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

// ============================================================================
// PER-WRITE OPTIONS
// ============================================================================

/// Options for one cache write: lifetime, destination tier, and group tags.
///
/// Also carried by the read-through wrapper, which passes them to `set`
/// verbatim on a miss-fill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// TTL for this entry; `None` uses the manager's default.
    pub ttl: Option<Duration>,

    /// Tier addressed by the write (default: memory).
    pub tier: Tier,

    /// Group labels for bulk invalidation.
    pub tags: BTreeSet<String>,
}

impl CacheOptions {
    /// Create options with defaults: manager TTL, memory tier, no tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the destination tier.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Add one group tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Add several group tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new()
            .with_default_ttl(Duration::from_secs(10))
            .with_sweep_interval(Duration::from_millis(250));
        assert_eq!(config.default_ttl, Duration::from_secs(10));
        assert_eq!(config.sweep_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_from_env_falls_back_on_garbage() {
        std::env::set_var("PROMPTFORGE_CACHE_DEFAULT_TTL_SECS", "not-a-number");
        let config = CacheConfig::from_env();
        assert_eq!(config.default_ttl, Duration::from_secs(DEFAULT_TTL_SECS));
        std::env::remove_var("PROMPTFORGE_CACHE_DEFAULT_TTL_SECS");
    }

    #[test]
    fn test_options_builder_accumulates_tags() {
        let options = CacheOptions::new()
            .with_ttl(Duration::from_secs(600))
            .with_tier(Tier::Persistent)
            .with_tag("models")
            .with_tags(["prompts", "prompt-detail"]);
        assert_eq!(options.ttl, Some(Duration::from_secs(600)));
        assert_eq!(options.tier, Tier::Persistent);
        assert_eq!(options.tags.len(), 3);
        assert!(options.tags.contains("models"));
        assert!(options.tags.contains("prompt-detail"));
    }

    #[test]
    fn test_options_default_tier_is_memory() {
        let options = CacheOptions::default();
        assert_eq!(options.tier, Tier::Memory);
        assert!(options.ttl.is_none());
        assert!(options.tags.is_empty());
    }
}
