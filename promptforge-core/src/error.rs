//! Error types for Promptforge operations

use thiserror::Error;

/// Cache layer errors.
///
/// These never cross the cache boundary: the manager absorbs them and
/// degrades (`set` becomes a no-op, `get` reports absent). They exist so
/// tier backends and substrates can report faults precisely for logging.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Durable store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Quota exceeded writing key {key}")]
    QuotaExceeded { key: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Remote API errors, as surfaced by the upstream collaborator.
///
/// The cache layer never converts or masks these; decorators pass them
/// through unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote API unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Request rejected: {reason}")]
    Rejected { reason: String },
}

/// Top-level error type composing all domain errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Convenience alias used across all Promptforge crates.
pub type ForgeResult<T> = Result<T, ForgeError>;
