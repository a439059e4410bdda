//! Event-to-WebSocket forwarding.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes};
use hemowatch_events::MachineEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Forwards machine events to every dashboard connection as text frames of
/// the form `{"type": "machine_update" | "machine_removed", "data": ...}`.
pub struct LiveUpdateForwarder {
    ws_manager: Arc<WsManager>,
}

impl LiveUpdateForwarder {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the forwarding loop.
    ///
    /// Exits when the channel is closed (the
    /// [`MachineEventBus`](hemowatch_events::MachineEventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<MachineEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.forward(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Live update forwarder lagged, some machine updates were not pushed"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, live update forwarder shutting down");
                    break;
                }
            }
        }
    }

    /// Encode and broadcast a single event.
    pub async fn forward(&self, event: &MachineEvent) {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    machine_id = event.machine_id(),
                    "Failed to encode machine event"
                );
                return;
            }
        };
        let delivered = self
            .ws_manager
            .broadcast(Message::Text(Utf8Bytes::from(text)))
            .await;
        tracing::debug!(
            machine_id = event.machine_id(),
            delivered,
            "Machine event pushed to dashboards"
        );
    }
}
