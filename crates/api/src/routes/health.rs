use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process answers.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub machine_count: usize,
    pub ws_connections: usize,
    pub event_subscribers: usize,
    /// Device silence tolerated before the sweep stops a running machine.
    pub heartbeat_timeout_secs: u64,
}

/// GET /health -- returns service liveness and tracker size.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        machine_count: state.registry.machine_count().await,
        ws_connections: state.ws_manager.connection_count().await,
        event_subscribers: state.event_bus.subscriber_count(),
        heartbeat_timeout_secs: state.config.engine.heartbeat_timeout.as_secs(),
    })
}

/// Mount health check routes (root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
