//! Integration tests for the machine monitoring HTTP surface.
//!
//! Requests go through the full router; time is driven by the test clock.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post_json, post_raw, TestApp};
use hemowatch_core::error_log::ERROR_HISTORY_CAPACITY;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn send_status(app: &TestApp, machine_id: &str, status: &str) -> Value {
    let response = post_json(
        app.router.clone(),
        "/api/v1/reports/status",
        json!({"machine_id": machine_id, "status": status}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn run_treatment(app: &TestApp, machine_id: &str, secs: i64) {
    send_status(app, machine_id, "running").await;
    app.clock.advance_secs(secs);
    send_status(app, machine_id, "stopped").await;
}

async fn machine(app: &TestApp, machine_id: &str) -> Value {
    let uri = format!("/api/v1/machines/{machine_id}");
    let response = get(app.router.clone(), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Status reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_report_creates_machine() {
    let app = common::build_test_app();

    let json = send_status(&app, "HD_001", "running").await;

    assert_eq!(json["data"]["machine_id"], "HD_001");
    assert_eq!(json["data"]["status"], "running");
    assert_eq!(json["data"]["pump_status"], "stopped");
    assert_eq!(json["data"]["completed_treatments"], 0);

    let list = body_json(get(app.router.clone(), "/api/v1/machines").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn short_session_is_not_counted_long_session_is() {
    let app = common::build_test_app();

    run_treatment(&app, "M1", 45).await;
    let snap = machine(&app, "M1").await;
    assert_eq!(snap["completed_treatments"], 0);
    assert_eq!(snap["total_active_time"], 45.0);

    app.clock.advance_secs(55);
    run_treatment(&app, "M1", 70).await;
    let snap = machine(&app, "M1").await;
    assert_eq!(snap["completed_treatments"], 1);
    assert_eq!(snap["total_active_time"], 115.0);
}

#[tokio::test]
async fn live_session_duration_is_reported() {
    let app = common::build_test_app();
    send_status(&app, "M1", "running").await;
    app.clock.advance_secs(42);

    let snap = machine(&app, "M1").await;
    assert_eq!(snap["current_session_duration"], 42.0);
    assert_eq!(snap["status"], "running");
}

#[tokio::test]
async fn device_alias_accepts_reports() {
    let app = common::build_test_app();

    let response = post_json(
        app.router.clone(),
        "/update",
        json!({"machine_id": "HD_002", "status": "running"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        app.router.clone(),
        "/pump-status",
        json!({"machine_id": "HD_002", "pump_status": "running"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["pump_status"], "running");
}

#[tokio::test]
async fn missing_fields_are_rejected_without_mutation() {
    let app = common::build_test_app();

    for (uri, body) in [
        ("/api/v1/reports/status", json!({"status": "running"})),
        ("/api/v1/reports/status", json!({"machine_id": "M1"})),
        (
            "/api/v1/reports/status",
            json!({"machine_id": "", "status": "running"}),
        ),
        ("/api/v1/reports/pump-status", json!({"machine_id": "M1"})),
        ("/api/v1/reports/errors", json!({"machine_id": "M1"})),
        ("/api/v1/reports/maintenance", json!({"machine_id": "M1"})),
    ] {
        let response = post_json(app.router.clone(), uri, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    assert_eq!(app.registry.machine_count().await, 0);
}

#[tokio::test]
async fn unknown_status_value_is_rejected() {
    let app = common::build_test_app();

    let response = post_json(
        app.router.clone(),
        "/api/v1/reports/status",
        json!({"machine_id": "M1", "status": "paused"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("paused"));
    assert_eq!(app.registry.machine_count().await, 0);
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let app = common::build_test_app();

    let response = post_raw(app.router.clone(), "/update", "{not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Pump coupling and heartbeat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn treatment_stop_closes_pump() {
    let app = common::build_test_app();
    send_status(&app, "M1", "running").await;
    post_json(
        app.router.clone(),
        "/api/v1/reports/pump-status",
        json!({"machine_id": "M1", "pump_status": "running"}),
    )
    .await;
    app.clock.advance_secs(90);

    let json = send_status(&app, "M1", "stopped").await;

    assert_eq!(json["data"]["pump_status"], "stopped");
    assert_eq!(json["data"]["total_dialysis_time"], 90.0);
    assert_eq!(json["data"]["completed_dialysis"], 1);
}

#[tokio::test]
async fn stale_machine_is_stopped_by_sweep() {
    let app = common::build_test_app();
    send_status(&app, "M1", "running").await;
    app.clock.advance_secs(100);

    let report = app.registry.sweep_stale_heartbeats().await;
    assert_eq!(report.stopped, vec!["M1".to_string()]);

    let snap = machine(&app, "M1").await;
    assert_eq!(snap["status"], "stopped");
    assert_eq!(snap["completed_treatments"], 1);
    assert_eq!(snap["total_active_time"], 100.0);
}

#[tokio::test]
async fn backwards_clock_answers_sanitized_500() {
    let app = common::build_test_app();
    send_status(&app, "M1", "running").await;
    app.clock.advance_secs(-30);

    let response = post_json(
        app.router.clone(),
        "/update",
        json!({"machine_id": "M1", "status": "stopped"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
    assert_eq!(machine(&app, "M1").await["status"], "running");
}

// ---------------------------------------------------------------------------
// Error log
// ---------------------------------------------------------------------------

#[tokio::test]
async fn error_reports_accept_numeric_and_text_codes() {
    let app = common::build_test_app();

    let response = post_json(
        app.router.clone(),
        "/error-log",
        json!({"machine_id": "M1", "error_code": 17, "type": "pressure"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app.router.clone(),
        "/api/v1/reports/errors",
        json!({
            "machine_id": "M1",
            "error_code": "E-PUMP-02",
            "occurred_at": "2026-03-01T08:59:00Z"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["error_count"], 2);

    let response = get(app.router.clone(), "/api/v1/machines/M1/errors").await;
    let errors = body_json(response).await;
    let errors = errors["data"].as_array().unwrap();
    assert_eq!(errors[0]["error_code"], 17);
    assert_eq!(errors[0]["type"], "pressure");
    assert_eq!(errors[1]["error_code"], "E-PUMP-02");
    assert_eq!(errors[1]["occurred_at"], "2026-03-01T08:59:00Z");
}

#[tokio::test]
async fn error_history_is_bounded() {
    let app = common::build_test_app();
    for code in 0..60 {
        post_json(
            app.router.clone(),
            "/api/v1/reports/errors",
            json!({"machine_id": "M1", "error_code": code}),
        )
        .await;
    }

    let response = get(app.router.clone(), "/api/v1/machines/M1/errors").await;
    let errors = body_json(response).await;
    let errors = errors["data"].as_array().unwrap();
    assert_eq!(errors.len(), ERROR_HISTORY_CAPACITY);
    assert_eq!(errors[0]["error_code"], 10);
    assert_eq!(errors[ERROR_HISTORY_CAPACITY - 1]["error_code"], 59);
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn maintenance_becomes_due_and_clears_on_acknowledge() {
    let app = common::build_test_app();
    for _ in 0..5 {
        run_treatment(&app, "M1", 60).await;
    }

    let snap = machine(&app, "M1").await;
    assert_eq!(snap["maintenance_count"], 1);
    assert_eq!(snap["maintenance_required"][0]["item"], "filter_inlet");
    assert_eq!(snap["maintenance_required"][0]["treatments_since_last"], 5);

    let response = post_json(
        app.router.clone(),
        "/maintenance-done",
        json!({"machine_id": "M1", "maintenance_item": "filter_inlet"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["maintenance_count"], 0);

    let response = get(app.router.clone(), "/api/v1/machines/M1/maintenance").await;
    let history = body_json(response).await;
    assert_eq!(history["data"][0]["item"], "filter_inlet");
    assert_eq!(history["data"][0]["treatment_count_at_service"], 5);
}

#[tokio::test]
async fn acknowledge_on_unknown_machine_is_404() {
    let app = common::build_test_app();

    let response = post_json(
        app.router.clone(),
        "/api/v1/reports/maintenance",
        json!({"machine_id": "ghost", "maintenance_item": "seal_ring"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    assert_eq!(app.registry.machine_count().await, 0);
}

// ---------------------------------------------------------------------------
// Reads and deletion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_machine_reads_are_404() {
    let app = common::build_test_app();

    for uri in [
        "/api/v1/machines/nope",
        "/api/v1/machines/nope/errors",
        "/api/v1/machines/nope/maintenance",
    ] {
        let response = get(app.router.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn delete_removes_machine() {
    let app = common::build_test_app();
    send_status(&app, "M1", "running").await;
    send_status(&app, "M2", "stopped").await;

    let response = delete(app.router.clone(), "/api/v1/machines/M1").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        app.router.clone(),
        "/delete-machine",
        json!({"machine_id": "M2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(app.registry.machine_count().await, 0);
    let response = delete(app.router.clone(), "/api/v1/machines/M1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn machines_named_like_report_routes_are_addressable() {
    let app = common::build_test_app();

    for machine_id in ["status", "pump-status", "errors", "maintenance"] {
        send_status(&app, machine_id, "running").await;

        let snap = machine(&app, machine_id).await;
        assert_eq!(snap["machine_id"], machine_id);

        let uri = format!("/api/v1/machines/{machine_id}/errors");
        let response = get(app.router.clone(), &uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");

        let uri = format!("/api/v1/machines/{machine_id}");
        let response = delete(app.router.clone(), &uri).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{uri}");
    }

    assert_eq!(app.registry.machine_count().await, 0);
}

#[tokio::test]
async fn long_machine_ids_are_accepted_verbatim() {
    let app = common::build_test_app();
    let machine_id = "x".repeat(129);

    let response = post_json(
        app.router.clone(),
        "/update",
        json!({"machine_id": machine_id, "status": "running"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["machine_id"], machine_id);
    assert_eq!(app.registry.machine_count().await, 1);
}

#[tokio::test]
async fn mutations_publish_events() {
    let app = common::build_test_app();
    let mut rx = app.event_bus.subscribe();

    send_status(&app, "M1", "running").await;
    delete(app.router.clone(), "/api/v1/machines/M1").await;

    let first = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
    let second = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
    assert_eq!(first["type"], "machine_update");
    assert_eq!(second["type"], "machine_removed");
    assert_eq!(second["data"]["machine_id"], "M1");
}
