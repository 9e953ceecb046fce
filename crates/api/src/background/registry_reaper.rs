//! Periodic eviction of finished jobs from the registry.
//!
//! Terminal records older than the retention window are dropped, then the
//! oldest terminal records while the registry is over capacity. Jobs still
//! pending or running are never touched.

use std::sync::Arc;
use std::time::Duration;

use carbuy_engine::{JobRegistry, RetentionPolicy};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Run the reaper loop until `cancel` is triggered.
pub async fn run(
    registry: Arc<JobRegistry>,
    policy: RetentionPolicy,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_secs = policy.retention.as_secs(),
        max_records = policy.max_records,
        interval_secs = interval.as_secs(),
        "Registry reaper started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Registry reaper stopping");
                break;
            }
            _ = ticker.tick() => {
                let evicted = registry.reap(Utc::now(), &policy).await;
                if evicted > 0 {
                    let remaining = registry.len().await;
                    tracing::info!(evicted, remaining, "Registry reaper: evicted jobs");
                } else {
                    tracing::debug!("Registry reaper: nothing to evict");
                }
            }
        }
    }
}
