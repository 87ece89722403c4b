//! Test server harness for E2E testing
//!
//! Provides `TestRoomServer` for spawning real Room service instances in tests.

use metrics_exporter_prometheus::PrometheusBuilder;
use room_service::actors::SessionRouterHandle;
use room_service::config::Config;
use room_service::models::RoomResponse;
use room_service::repositories::JsonFileSnapshotStore;
use room_service::routes::{self, AppState};
use room_service::services::{AccessController, AddressGenerator, RoomRegistry};
use room_service::tasks::{load_initial_snapshot, SnapshotWriterHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Test harness for spawning the Room service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<(), anyhow::Error> {
///     let server = TestRoomServer::spawn().await?;
///
///     let response = reqwest::get(&format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestRoomServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    cancel_token: CancellationToken,
    snapshot_task: Option<JoinHandle<()>>,
    _handle: JoinHandle<()>,
}

impl TestRoomServer {
    /// Spawn a server with an in-memory registry (no snapshot file).
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_inner(None).await
    }

    /// Spawn a server that loads from and snapshots to `path`.
    pub async fn spawn_with_snapshot_path(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        Self::spawn_inner(Some(path.as_ref())).await
    }

    async fn spawn_inner(snapshot_path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string())]);
        if let Some(path) = snapshot_path {
            vars.insert(
                "ROOMS_SNAPSHOT_PATH".to_string(),
                path.display().to_string(),
            );
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let cancel_token = CancellationToken::new();
        let generator = AddressGenerator::new();

        let (snapshots, snapshot_task, snapshot) = match snapshot_path {
            Some(path) => {
                let store = Arc::new(JsonFileSnapshotStore::new(path));
                let snapshot = load_initial_snapshot(store.as_ref()).await;
                let (handle, task) = SnapshotWriterHandle::spawn(store, cancel_token.child_token());
                (Some(handle), Some(task), Some(snapshot))
            }
            None => (None, None, None),
        };

        let registry = Arc::new(RoomRegistry::new(generator.clone(), snapshots));
        if let Some(snapshot) = snapshot {
            registry.load_snapshot(snapshot).await;
        }

        let access = Arc::new(AccessController::new(Arc::clone(&registry), &generator));
        let router = SessionRouterHandle::new(
            config.session_outbound_buffer,
            generator,
            cancel_token.child_token(),
        );

        let state = Arc::new(AppState {
            config,
            registry,
            access,
            router,
        });

        // A recorder that is not installed globally, so servers can coexist
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        // Build routes using room-service's real route builder
        let app = routes::build_routes(Arc::clone(&state), metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            cancel_token,
            snapshot_task,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL for joining `address` with `key`.
    pub fn ws_url(&self, address: &str, key: &str) -> String {
        format!("ws://{}/ws/{}?key={}", self.addr, address, key)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the application state shared with the handlers.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Create a room through the HTTP API.
    pub async fn create_room(&self) -> Result<RoomResponse, anyhow::Error> {
        let response = reqwest::Client::new()
            .post(format!("{}/api/v1/rooms", self.url()))
            .send()
            .await?;

        anyhow::ensure!(
            response.status() == reqwest::StatusCode::CREATED,
            "unexpected status creating room: {}",
            response.status()
        );

        Ok(response.json().await?)
    }

    /// Stop the server, close live sessions and flush pending snapshots.
    pub async fn shutdown(mut self) -> Result<(), anyhow::Error> {
        self._handle.abort();
        self.cancel_token.cancel();
        if let Some(task) = self.snapshot_task.take() {
            task.await?;
        }
        Ok(())
    }
}

impl Drop for TestRoomServer {
    fn drop(&mut self) {
        // Explicitly abort the HTTP server task and stop the actors to ensure
        // immediate cleanup when the test completes.
        self._handle.abort();
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestRoomServer::spawn().await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));

        let response = reqwest::get(&format!("{}/health", server.url())).await?;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await?, "OK");

        Ok(())
    }

    #[tokio::test]
    async fn test_server_provides_addr() -> Result<(), anyhow::Error> {
        let server = TestRoomServer::spawn().await?;
        let addr = server.addr();

        assert!(addr.ip().is_loopback());
        assert!(addr.port() > 0);
        assert_eq!(server.url(), format!("http://{}", addr));
        assert_eq!(
            server.ws_url("0xabc", "public"),
            format!("ws://{}/ws/0xabc?key=public", addr)
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_room_helper() -> Result<(), anyhow::Error> {
        let server = TestRoomServer::spawn().await?;
        let room = server.create_room().await?;

        assert!(server
            .state()
            .registry
            .lookup(&room.address)
            .await
            .is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_servers_different_ports() -> Result<(), anyhow::Error> {
        let server1 = TestRoomServer::spawn().await?;
        let server2 = TestRoomServer::spawn().await?;

        assert_ne!(server1.addr(), server2.addr());

        let response1 = reqwest::get(&format!("{}/health", server1.url())).await?;
        assert_eq!(response1.status(), 200);

        let response2 = reqwest::get(&format!("{}/health", server2.url())).await?;
        assert_eq!(response2.status(), 200);

        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_flushes_snapshot() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("rooms.json");

        let server = TestRoomServer::spawn_with_snapshot_path(&path).await?;
        let room = server.create_room().await?;
        server.shutdown().await?;

        let contents = std::fs::read_to_string(&path)?;
        assert!(contents.contains(&room.address));

        Ok(())
    }
}
