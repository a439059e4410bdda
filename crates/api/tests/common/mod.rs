#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use hemowatch_core::clock::{Clock, ManualClock};
use hemowatch_core::config::EngineConfig;
use hemowatch_core::notifier::SnapshotNotifier;
use hemowatch_core::registry::MachineRegistry;
use hemowatch_events::MachineEventBus;
use http_body_util::BodyExt;
use tower::ServiceExt;

use hemowatch_api::config::ServerConfig;
use hemowatch_api::router::build_app_router;
use hemowatch_api::state::AppState;
use hemowatch_api::ws::WsManager;

/// Build a test `ServerConfig` with the development defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        engine: EngineConfig::default(),
    }
}

/// A fully wired application with a controllable clock.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub registry: Arc<MachineRegistry>,
    pub event_bus: Arc<MachineEventBus>,
    pub ws_manager: Arc<WsManager>,
}

/// Build the application through [`build_app_router`] so tests exercise the
/// production middleware stack.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
    ));
    let event_bus = Arc::new(MachineEventBus::default());
    let registry = Arc::new(MachineRegistry::new(
        config.engine.clone(),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&event_bus) as Arc<dyn SnapshotNotifier>,
    ));
    let ws_manager = Arc::new(WsManager::new());

    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
    };

    TestApp {
        router: build_app_router(state, &config),
        clock,
        registry,
        event_bus,
        ws_manager,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
