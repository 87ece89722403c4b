//! HTTP routes for the Room service.
//!
//! Defines the Axum router and application state.

use crate::actors::SessionRouterHandle;
use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::{AccessController, RoomRegistry};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Room registry.
    pub registry: Arc<RoomRegistry>,

    /// Connect attempt authorization against `registry`.
    pub access: Arc<AccessController>,

    /// Handle to the session router actor.
    pub router: SessionRouterHandle,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK")
/// - `/ready` - Readiness probe (checks the session router)
/// - `/metrics` - Prometheus metrics endpoint
/// - `POST /api/v1/rooms` - Create a room
/// - `GET /api/v1/rooms/{address}` - Look up a room
/// - `POST /api/contract/create`, `GET /api/contract/{address}` - Same, in the
///   wallet-client response shape
/// - `GET /ws/{address}?key=...` - Join a room over WebSocket
/// - Permissive CORS, TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout (upgraded sessions are not affected)
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let app_routes = Router::new()
        // Health check endpoints (unversioned operational endpoints)
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // Rooms API
        .route("/api/v1/rooms", post(handlers::create_room))
        .route("/api/v1/rooms/:address", get(handlers::get_room))
        // Wallet-client compatibility
        .route("/api/contract/create", post(handlers::create_contract))
        .route("/api/contract/:address", get(handlers::get_contract))
        // Real-time sessions
        .route("/ws/:address", get(handlers::connect))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Browser clients on any origin
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    app_routes
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// In-memory state for handler unit tests.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn test_state() -> Arc<AppState> {
    use crate::services::AddressGenerator;
    use std::collections::HashMap;
    use tokio_util::sync::CancellationToken;

    let config = Config::from_vars(&HashMap::new()).expect("default config should load");
    let generator = AddressGenerator::new();
    let registry = Arc::new(RoomRegistry::new(generator.clone(), None));
    let access = Arc::new(AccessController::new(Arc::clone(&registry), &generator));
    let router = SessionRouterHandle::new(
        config.session_outbound_buffer,
        generator,
        CancellationToken::new(),
    );

    Arc::new(AppState {
        config,
        registry,
        access,
        router,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn app() -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_routes(test_state(), handle)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_create_then_get_room() {
        let app = app();

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/rooms")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let address = created["address"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::get(format!("/api/v1/rooms/{}", address))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let found = body_json(response).await;
        assert_eq!(found["access_key"], created["access_key"]);
    }

    #[tokio::test]
    async fn test_connect_unknown_room_without_key_is_unauthorized() {
        let response = app()
            .oneshot(Request::get("/ws/0xnope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_connect_allowed_without_upgrade_is_bad_request() {
        let response = app()
            .oneshot(
                Request::get("/ws/0xnope?key=public")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_connect_repeated_key_uses_first_value() {
        let response = app()
            .oneshot(
                Request::get("/ws/0xnope?key=public&key=other")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // Allowed by the public override, then rejected for lacking an upgrade
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app()
            .oneshot(
                Request::get("/ws/0xnope?key=other&key=public")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_connect_undecodable_key_is_authorized_not_rejected() {
        let response = app()
            .oneshot(
                Request::get("/ws/0xnope?key=%ZZ%FF")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/v1/rooms")
                    .header("origin", "https://example.org")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
