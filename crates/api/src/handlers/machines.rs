//! Handlers for machine monitoring endpoints.
//!
//! Every handler is a thin adapter: it checks the request body for required
//! fields, converts wire values into core types, and delegates to
//! [`MachineRegistry`](hemowatch_core::registry::MachineRegistry).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hemowatch_core::error::CoreError;
use hemowatch_core::error_log::{ErrorCode, ErrorRecord, ErrorReport};
use hemowatch_core::maintenance::{MaintenanceItem, MaintenanceRecord};
use hemowatch_core::snapshot::MachineSnapshot;
use hemowatch_core::status::RunStatus;
use hemowatch_core::types::Timestamp;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

// Fields are optional so a missing field yields VALIDATION_ERROR rather than
// a deserialization failure.

/// Body of a treatment status report (device heartbeat).
#[derive(Debug, Deserialize)]
pub struct StatusReportRequest {
    pub machine_id: Option<String>,
    pub status: Option<String>,
}

/// Body of a dialysis-pump status report.
#[derive(Debug, Deserialize)]
pub struct PumpStatusRequest {
    pub machine_id: Option<String>,
    pub pump_status: Option<String>,
}

/// Body of a device fault report.
#[derive(Debug, Deserialize)]
pub struct ErrorReportRequest {
    pub machine_id: Option<String>,
    pub error_code: Option<ErrorCode>,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub occurred_at: Option<Timestamp>,
}

/// Body of a maintenance acknowledgement.
#[derive(Debug, Deserialize)]
pub struct MaintenanceDoneRequest {
    pub machine_id: Option<String>,
    pub maintenance_item: Option<String>,
}

/// Body of the device-facing delete call.
#[derive(Debug, Deserialize)]
pub struct DeleteMachineRequest {
    pub machine_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /machines
pub async fn list_machines(
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<MachineSnapshot>>> {
    let snapshots = state.registry.list_snapshots().await;
    Json(DataResponse { data: snapshots })
}

/// GET /machines/{id}
pub async fn get_machine(
    State(state): State<AppState>,
    Path(machine_id): Path<String>,
) -> AppResult<Json<DataResponse<MachineSnapshot>>> {
    let snapshot = state.registry.snapshot(&machine_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// GET /machines/{id}/errors
///
/// Recent fault records, oldest first.
pub async fn get_machine_errors(
    State(state): State<AppState>,
    Path(machine_id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<ErrorRecord>>>> {
    let records = state.registry.error_history(&machine_id).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /machines/{id}/maintenance
pub async fn get_machine_maintenance(
    State(state): State<AppState>,
    Path(machine_id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<MaintenanceRecord>>>> {
    let records = state.registry.maintenance_history(&machine_id).await?;
    Ok(Json(DataResponse { data: records }))
}

// ---------------------------------------------------------------------------
// Device reports
// ---------------------------------------------------------------------------

/// POST /reports/status (device alias: POST /update)
pub async fn report_status(
    State(state): State<AppState>,
    AppJson(input): AppJson<StatusReportRequest>,
) -> AppResult<Json<DataResponse<MachineSnapshot>>> {
    let machine_id = required(input.machine_id, "machine_id")?;
    let status: RunStatus = required(input.status, "status")?.parse()?;

    let snapshot = state.registry.report_status(&machine_id, status).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// POST /reports/pump-status (device alias: POST /pump-status)
pub async fn report_pump_status(
    State(state): State<AppState>,
    AppJson(input): AppJson<PumpStatusRequest>,
) -> AppResult<Json<DataResponse<MachineSnapshot>>> {
    let machine_id = required(input.machine_id, "machine_id")?;
    let status: RunStatus = required(input.pump_status, "pump_status")?.parse()?;

    let snapshot = state
        .registry
        .report_pump_status(&machine_id, status)
        .await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// POST /reports/errors (device alias: POST /error-log)
pub async fn report_error(
    State(state): State<AppState>,
    AppJson(input): AppJson<ErrorReportRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<MachineSnapshot>>)> {
    let machine_id = required(input.machine_id, "machine_id")?;
    let error_code = input.error_code.ok_or_else(|| missing_field("error_code"))?;

    let mut report = ErrorReport::new(error_code);
    if let Some(error_type) = input.error_type.filter(|t| !t.trim().is_empty()) {
        report = report.with_type(error_type);
    }
    if let Some(occurred_at) = input.occurred_at {
        report = report.with_occurred_at(occurred_at);
    }

    let snapshot = state.registry.report_error(&machine_id, report).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: snapshot })))
}

/// POST /reports/maintenance (device alias: POST /maintenance-done)
pub async fn acknowledge_maintenance(
    State(state): State<AppState>,
    AppJson(input): AppJson<MaintenanceDoneRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<MachineSnapshot>>)> {
    let machine_id = required(input.machine_id, "machine_id")?;
    let item = required(input.maintenance_item, "maintenance_item")?;
    let item = MaintenanceItem::parse(&item)?;

    let snapshot = state
        .registry
        .acknowledge_maintenance(&machine_id, item)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: snapshot })))
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// DELETE /machines/{id}
pub async fn delete_machine(
    State(state): State<AppState>,
    Path(machine_id): Path<String>,
) -> AppResult<StatusCode> {
    state.registry.delete_machine(&machine_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /delete-machine
///
/// Device-facing form of [`delete_machine`] with the id in the body.
pub async fn delete_machine_by_body(
    State(state): State<AppState>,
    AppJson(input): AppJson<DeleteMachineRequest>,
) -> AppResult<StatusCode> {
    let machine_id = required(input.machine_id, "machine_id")?;
    state.registry.delete_machine(&machine_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Require a present, non-blank string field.
fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing_field(field))
}

fn missing_field(field: &str) -> AppError {
    AppError::Core(CoreError::InvalidArgument(format!("{field} is required")))
}
