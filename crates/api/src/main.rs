use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hemowatch_core::clock::{Clock, SystemClock};
use hemowatch_core::notifier::SnapshotNotifier;
use hemowatch_core::registry::MachineRegistry;
use hemowatch_events::MachineEventBus;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hemowatch_api::config::ServerConfig;
use hemowatch_api::notifications::LiveUpdateForwarder;
use hemowatch_api::router::build_app_router;
use hemowatch_api::state::AppState;
use hemowatch_api::{background, ws};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hemowatch_api=debug,hemowatch_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        heartbeat_timeout_secs = config.engine.heartbeat_timeout.as_secs(),
        min_treatment_secs = config.engine.min_treatment_duration.as_secs(),
        "Loaded server configuration"
    );

    // --- Event bus + registry ---
    let event_bus = Arc::new(MachineEventBus::default());
    let registry = Arc::new(MachineRegistry::new(
        config.engine.clone(),
        Arc::new(SystemClock) as Arc<dyn Clock>,
        Arc::clone(&event_bus) as Arc<dyn SnapshotNotifier>,
    ));
    tracing::info!("Machine registry created");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let ws_heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // Push every machine event to connected dashboards.
    let forwarder = LiveUpdateForwarder::new(Arc::clone(&ws_manager));
    let forwarder_handle = tokio::spawn(forwarder.run(event_bus.subscribe()));

    // --- Heartbeat monitor ---
    let monitor_cancel = CancellationToken::new();
    let monitor_handle = tokio::spawn(background::heartbeat_monitor::run(
        Arc::clone(&registry),
        config.engine.sweep_interval,
        monitor_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    monitor_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), monitor_handle).await;
    tracing::info!("Heartbeat monitor stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    // The registry holds a bus reference too; both must go for the
    // forwarder to observe a closed channel.
    drop(registry);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), forwarder_handle).await;
    tracing::info!("Live update forwarder shut down");

    ws_heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
