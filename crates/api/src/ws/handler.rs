use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use hemowatch_core::notifier::MachineEvent;
use hemowatch_core::registry::MachineRegistry;

use crate::state::AppState;
use crate::ws::manager::WsManager;

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, state.registry))
}

/// Manage a single dashboard connection after upgrade.
///
///   1. Registers the connection with `WsManager`.
///   2. Queues one `machine_update` frame per known machine so the client
///      starts from the full current state.
///   3. Spawns a sender task that forwards queued messages to the sink.
///   4. Drains inbound frames until the client goes away, then cleans up.
async fn handle_socket(
    socket: WebSocket,
    ws_manager: Arc<WsManager>,
    registry: Arc<MachineRegistry>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    for snapshot in registry.list_snapshots().await {
        match serde_json::to_string(&MachineEvent::Updated(snapshot)) {
            Ok(text) => {
                if sink.send(Message::Text(Utf8Bytes::from(text))).await.is_err() {
                    ws_manager.remove(&conn_id).await;
                    return;
                }
            }
            Err(e) => {
                tracing::error!(
                    conn_id = %conn_id,
                    error = %e,
                    "Failed to encode initial snapshot"
                );
            }
        }
    }

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            // Dashboards are receive-only.
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
