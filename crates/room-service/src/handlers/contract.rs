//! Wallet-client compatibility handlers.
//!
//! Existing wallet clients create and look up rooms under `/api/contract`.
//! These routes share the registry with `/api/v1/rooms` and differ only in
//! the response shape (`qr_string`, `status`) and the 200 on creation.

use crate::errors::RoomError;
use crate::models::ContractResponse;
use crate::routes::AppState;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/contract/create
#[instrument(skip_all, name = "rooms.handler.create_contract")]
pub async fn create_contract(State(state): State<Arc<AppState>>) -> Json<ContractResponse> {
    let room = state.registry.create_room().await;
    Json(ContractResponse::created(&room))
}

/// Handler for GET /api/contract/{address}
#[instrument(skip_all, name = "rooms.handler.get_contract")]
pub async fn get_contract(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ContractResponse>, RoomError> {
    let room = state
        .registry
        .lookup(&address)
        .await
        .ok_or_else(|| RoomError::NotFound("Room not found".to_string()))?;

    Ok(Json(ContractResponse::from(&room)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::routes::test_state;

    #[tokio::test]
    async fn test_create_contract_registers_room() {
        let state = test_state();

        let Json(body) = create_contract(State(state.clone())).await;

        assert_eq!(body.status.as_deref(), Some("success"));
        assert_eq!(
            body.qr_string,
            format!("walletchat://{}?key={}", body.address, body.access_key)
        );
        assert!(state.registry.lookup(&body.address).await.is_some());
    }

    #[tokio::test]
    async fn test_get_contract_not_found() {
        let state = test_state();

        let result = get_contract(State(state), Path("0xmissing".to_string())).await;
        assert!(matches!(result, Err(RoomError::NotFound(_))));
    }
}
