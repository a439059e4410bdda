//! Periodic sweep that stops machines whose heartbeat has gone silent.
//!
//! Runs [`MachineRegistry::sweep_stale_heartbeats`] on a fixed
//! `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use hemowatch_core::registry::MachineRegistry;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the heartbeat sweep loop until `cancel` is triggered.
pub async fn run(registry: Arc<MachineRegistry>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        timeout_secs = registry.config().heartbeat_timeout.as_secs(),
        "Heartbeat monitor started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Heartbeat monitor stopping");
                break;
            }
            _ = ticker.tick() => {
                let report = registry.sweep_stale_heartbeats().await;
                if report.is_empty() {
                    tracing::trace!("Heartbeat sweep: all machines healthy");
                } else {
                    tracing::info!(
                        stopped = report.stopped.len(),
                        failed = report.failed.len(),
                        "Heartbeat sweep: stale machines processed"
                    );
                }
            }
        }
    }
}
