pub mod health;
pub mod machines;
pub mod reports;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                  WebSocket (live machine updates)
///
/// /machines                            list snapshots
/// /machines/{id}                       get, delete
/// /machines/{id}/errors                recent fault records
/// /machines/{id}/maintenance           maintenance history
///
/// /reports/status                      treatment status report (POST)
/// /reports/pump-status                 pump status report (POST)
/// /reports/errors                      fault report (POST)
/// /reports/maintenance                 maintenance acknowledgement (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/machines", machines::router())
        .nest("/reports", reports::router())
}

/// Root-level paths posted to by field firmware.
///
/// ```text
/// POST /update                         -> report_status
/// POST /pump-status                    -> report_pump_status
/// POST /error-log                      -> report_error
/// POST /maintenance-done               -> acknowledge_maintenance
/// POST /delete-machine                 -> delete_machine_by_body
/// ```
pub fn device_routes() -> Router<AppState> {
    Router::new()
        .route("/update", post(handlers::machines::report_status))
        .route("/pump-status", post(handlers::machines::report_pump_status))
        .route("/error-log", post(handlers::machines::report_error))
        .route(
            "/maintenance-done",
            post(handlers::machines::acknowledge_maintenance),
        )
        .route(
            "/delete-machine",
            post(handlers::machines::delete_machine_by_body),
        )
}
