//! Route definitions for machine monitoring endpoints.

use axum::routing::get;
use axum::Router;

use crate::handlers::machines;
use crate::state::AppState;

/// Routes mounted at `/api/v1/machines`.
///
/// Every path below `/` is keyed by machine id, so any id a device can
/// report under is also readable and deletable here.
///
/// ```text
/// GET    /                    -> list_machines
/// GET    /{id}                -> get_machine
/// DELETE /{id}                -> delete_machine
/// GET    /{id}/errors         -> get_machine_errors
/// GET    /{id}/maintenance    -> get_machine_maintenance
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(machines::list_machines))
        .route(
            "/{id}",
            get(machines::get_machine).delete(machines::delete_machine),
        )
        .route("/{id}/errors", get(machines::get_machine_errors))
        .route("/{id}/maintenance", get(machines::get_machine_maintenance))
}
