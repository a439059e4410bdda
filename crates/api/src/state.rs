use std::sync::Arc;

use hemowatch_core::registry::MachineRegistry;
use hemowatch_events::MachineEventBus;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Sole owner of all machine state.
    pub registry: Arc<MachineRegistry>,
    /// WebSocket connection manager (dashboard clients).
    pub ws_manager: Arc<WsManager>,
    /// Bus the registry publishes machine events into.
    pub event_bus: Arc<MachineEventBus>,
}
