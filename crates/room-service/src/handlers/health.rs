//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks that the session router answers

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Does NOT check any dependencies - failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 with room and session counts when the session router actor
/// answers, 503 otherwise.
#[tracing::instrument(skip_all, name = "rooms.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rooms = state.registry.len().await;

    match state.router.status().await {
        Ok(status) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready".to_string(),
                rooms,
                sessions: Some(status.sessions),
            }),
        ),
        Err(e) => {
            tracing::warn!(
                target: "rooms.health",
                error = %e,
                "Readiness check failed: session router unavailable"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready".to_string(),
                    rooms,
                    sessions: None,
                }),
            )
        }
    }
}
