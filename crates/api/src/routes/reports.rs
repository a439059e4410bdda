//! Route definitions for device reports.

use axum::routing::post;
use axum::Router;

use crate::handlers::machines;
use crate::state::AppState;

/// Routes mounted at `/api/v1/reports`.
///
/// ```text
/// POST   /status              -> report_status
/// POST   /pump-status         -> report_pump_status
/// POST   /errors              -> report_error
/// POST   /maintenance         -> acknowledge_maintenance
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", post(machines::report_status))
        .route("/pump-status", post(machines::report_pump_status))
        .route("/errors", post(machines::report_error))
        .route("/maintenance", post(machines::acknowledge_maintenance))
}
