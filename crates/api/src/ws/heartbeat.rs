use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Interval between keep-alive pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that pings every connected dashboard client.
///
/// Unrelated to device heartbeats; this only keeps idle sockets open. The
/// returned handle is aborted during shutdown.
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = ws_manager.connection_count().await;
            tracing::debug!(count, "WebSocket keep-alive ping");
            ws_manager.ping_all().await;
        }
    })
}
