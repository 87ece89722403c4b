//! Room Service
//!
//! Entry point for the ephemeral chat room relay.

use metrics_exporter_prometheus::PrometheusBuilder;
use room_service::actors::SessionRouterHandle;
use room_service::config::Config;
use room_service::repositories::JsonFileSnapshotStore;
use room_service::routes::{self, AppState};
use room_service::services::{AccessController, AddressGenerator, RoomRegistry};
use room_service::tasks::{load_initial_snapshot, SnapshotWriterHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "room_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Room Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        rooms_snapshot_path = %config.rooms_snapshot_path,
        max_message_bytes = config.max_message_bytes,
        session_outbound_buffer = config.session_outbound_buffer,
        drain_seconds = config.drain_seconds,
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder
    let metrics_handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        error!("Failed to install Prometheus metrics recorder: {}", e);
        e
    })?;

    // Parse bind address before moving config
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let cancel_token = CancellationToken::new();
    let generator = AddressGenerator::new();

    // Restore rooms, then start persisting new ones
    let store = Arc::new(JsonFileSnapshotStore::new(&config.rooms_snapshot_path));
    let snapshot = load_initial_snapshot(store.as_ref()).await;
    let (snapshots, snapshot_task) = SnapshotWriterHandle::spawn(store, cancel_token.child_token());

    let registry = Arc::new(RoomRegistry::new(generator.clone(), Some(snapshots)));
    registry.load_snapshot(snapshot).await;

    let access = Arc::new(AccessController::new(Arc::clone(&registry), &generator));
    let router = SessionRouterHandle::new(
        config.session_outbound_buffer,
        generator,
        cancel_token.child_token(),
    );

    let drain_seconds = config.drain_seconds;
    let state = Arc::new(AppState {
        config,
        registry,
        access,
        router,
    });

    let app = routes::build_routes(state, metrics_handle);

    info!("Room Service listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(drain_seconds))
    .await?;

    // Close live sessions and flush pending snapshots
    cancel_token.cancel();
    if let Err(e) = snapshot_task.await {
        error!("Snapshot writer task failed: {}", e);
    }

    info!("Room Service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal(drain_seconds: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    if drain_seconds > 0 {
        warn!("Draining connections for {} seconds...", drain_seconds);
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (DRAIN_SECONDS=0)");
    }
}
