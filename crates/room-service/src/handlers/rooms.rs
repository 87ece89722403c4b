//! Room handlers.
//!
//! - `POST /api/v1/rooms` creates a room
//! - `GET /api/v1/rooms/{address}` looks one up

use crate::errors::RoomError;
use crate::models::RoomResponse;
use crate::routes::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/rooms
///
/// Creates a room with a fresh address and access key. No request body.
///
/// # Response
///
/// 201 Created:
/// ```json
/// {
///   "address": "0x00112233445566778899",
///   "access_key": "0b1c7a62-6f0e-4e38-9a55-1e0d5c4d3c2b",
///   "invite_uri": "walletchat://0x00112233445566778899?key=0b1c7a62-6f0e-4e38-9a55-1e0d5c4d3c2b",
///   "created_at": 1700000000
/// }
/// ```
#[instrument(skip_all, name = "rooms.handler.create_room")]
pub async fn create_room(State(state): State<Arc<AppState>>) -> (StatusCode, Json<RoomResponse>) {
    let room = state.registry.create_room().await;
    (StatusCode::CREATED, Json(RoomResponse::from(&room)))
}

/// Handler for GET /api/v1/rooms/{address}
///
/// # Errors
///
/// - 404 if no room exists at the address
#[instrument(skip_all, name = "rooms.handler.get_room")]
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<RoomResponse>, RoomError> {
    let room = state
        .registry
        .lookup(&address)
        .await
        .ok_or_else(|| RoomError::NotFound("Room not found".to_string()))?;

    Ok(Json(RoomResponse::from(&room)))
}
