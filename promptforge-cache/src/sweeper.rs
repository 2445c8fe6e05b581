//! Periodic expiry sweep.
//!
//! Lazy expiry on the read path only removes entries that something asks
//! for again. The sweeper walks all three tiers on a fixed interval and
//! drops entries whose TTL has lapsed, so abandoned keys do not pile up
//! in the durable tiers. Per-tier failures are logged inside the manager
//! and the sweep moves on; the task itself only stops on shutdown.
//!
//! # Usage
//!
//! ```ignore
//! use promptforge_cache::{CacheConfig, CacheManager, SweeperHandle};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(CacheManager::in_memory(CacheConfig::default()));
//! let sweeper = SweeperHandle::spawn(Arc::clone(&manager));
//!
//! // On shutdown
//! let totals = sweeper.shutdown().await;
//! tracing::info!(swept = totals.entries_swept, "Sweeper drained");
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::manager::CacheManager;

// ============================================================================
// METRICS
// ============================================================================

/// Counters tracking sweep activity since the task started.
#[derive(Debug, Default)]
pub struct SweeperMetrics {
    /// Total sweep cycles completed.
    pub sweep_cycles: AtomicU64,

    /// Total entries removed across all cycles.
    pub entries_swept: AtomicU64,
}

impl SweeperMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> SweeperSnapshot {
        SweeperSnapshot {
            sweep_cycles: self.sweep_cycles.load(Ordering::Relaxed),
            entries_swept: self.entries_swept.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sweeper metrics at a point in time.
#[derive(Debug, Clone, Copy)]
pub struct SweeperSnapshot {
    pub sweep_cycles: u64,
    pub entries_swept: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Sweep all tiers on the manager's configured interval until shutdown.
///
/// The interval comes from the manager's `CacheConfig::sweep_interval`.
/// The task stops when the shutdown signal flips to `true`, and also when
/// the sender side of the channel is dropped.
pub async fn sweep_task(
    manager: Arc<CacheManager>,
    metrics: Arc<SweeperMetrics>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let sweep_interval = manager.config().sweep_interval;
    let mut tick = interval(sweep_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        sweep_interval_ms = sweep_interval.as_millis() as u64,
        "Expiry sweeper started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // A dropped sender counts as shutdown, otherwise the loop
                // would spin on the closed channel.
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Expiry sweeper shutting down");
                    break;
                }
            }

            _ = tick.tick() => {
                let swept = manager.clear_expired().await;
                metrics.sweep_cycles.fetch_add(1, Ordering::Relaxed);
                if swept > 0 {
                    metrics.entries_swept.fetch_add(swept, Ordering::Relaxed);
                    debug!(swept, "Sweep cycle removed expired entries");
                }
            }
        }
    }

    let snapshot = metrics.snapshot();
    info!(
        sweep_cycles = snapshot.sweep_cycles,
        entries_swept = snapshot.entries_swept,
        "Expiry sweeper stopped"
    );
}

// ============================================================================
// HANDLE
// ============================================================================

/// Owner handle for a spawned sweeper task.
///
/// Dropping the handle also stops the task: the shutdown channel closes
/// and the loop exits on the next wakeup.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    metrics: Arc<SweeperMetrics>,
}

impl SweeperHandle {
    /// Spawn the sweep task on the current tokio runtime.
    pub fn spawn(manager: Arc<CacheManager>) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let metrics = Arc::new(SweeperMetrics::new());
        let task = tokio::spawn(sweep_task(manager, Arc::clone(&metrics), shutdown_rx));
        Self {
            shutdown,
            task,
            metrics,
        }
    }

    /// Live view of the sweep counters.
    pub fn metrics(&self) -> SweeperSnapshot {
        self.metrics.snapshot()
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) -> SweeperSnapshot {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
        self.metrics.snapshot()
    }
}

impl std::fmt::Debug for SweeperHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweeperHandle")
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, CacheOptions};
    use crate::entry::Tier;
    use std::time::Duration;

    fn make_fast_manager() -> Arc<CacheManager> {
        let config = CacheConfig::default().with_sweep_interval(Duration::from_millis(20));
        Arc::new(CacheManager::in_memory(config))
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let manager = make_fast_manager();
        for tier in Tier::ALL {
            let options = CacheOptions::new()
                .with_tier(tier)
                .with_ttl(Duration::ZERO);
            manager.set("stale", &1_u32, &options).await;
        }
        manager
            .set(
                "fresh",
                &2_u32,
                &CacheOptions::new().with_ttl(Duration::from_secs(3600)),
            )
            .await;

        let sweeper = SweeperHandle::spawn(Arc::clone(&manager));
        tokio::time::sleep(Duration::from_millis(200)).await;
        let totals = sweeper.shutdown().await;

        assert!(totals.sweep_cycles >= 1);
        assert_eq!(totals.entries_swept, 3);

        let stats = manager.stats().await;
        assert_eq!(stats.tiers[&Tier::Memory].keys, vec!["fresh".to_string()]);
        assert_eq!(stats.tiers[&Tier::Persistent].size, 0);
        assert_eq!(stats.tiers[&Tier::Session].size, 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweeping() {
        let manager = make_fast_manager();
        let sweeper = SweeperHandle::spawn(Arc::clone(&manager));
        sweeper.shutdown().await;

        // Entries expiring after shutdown stay until something reads them.
        manager
            .set("stale", &1_u32, &CacheOptions::new().with_ttl(Duration::ZERO))
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stats = manager.stats().await;
        assert_eq!(stats.tiers[&Tier::Memory].size, 1);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_task() {
        let manager = make_fast_manager();
        let sweeper = SweeperHandle::spawn(Arc::clone(&manager));
        drop(sweeper);

        // Give the task a moment to observe the closed channel.
        tokio::time::sleep(Duration::from_millis(50)).await;

        manager
            .set("stale", &1_u32, &CacheOptions::new().with_ttl(Duration::ZERO))
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stats = manager.stats().await;
        assert_eq!(stats.tiers[&Tier::Memory].size, 1);
    }

    #[tokio::test]
    async fn test_metrics_track_cycles() {
        let manager = make_fast_manager();
        let sweeper = SweeperHandle::spawn(manager);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let live = sweeper.metrics();
        let totals = sweeper.shutdown().await;

        assert!(live.sweep_cycles >= 2);
        assert!(totals.sweep_cycles >= live.sweep_cycles);
        assert_eq!(totals.entries_swept, 0);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = SweeperMetrics::new();
        metrics.sweep_cycles.store(7, Ordering::Relaxed);
        metrics.entries_swept.store(42, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sweep_cycles, 7);
        assert_eq!(snapshot.entries_swept, 42);
    }
}
