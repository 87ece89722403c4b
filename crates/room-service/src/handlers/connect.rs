//! Real-time connection handler.
//!
//! `GET /ws/{address}?key=...` authorizes the attempt before looking at the
//! upgrade headers, so a plain GET still learns 401 or 403. Only an allowed
//! attempt is upgraded. The query string is decoded leniently: a repeated
//! `key` takes its first value and undecodable bytes never cause a 400.
//!
//! After the upgrade the session task:
//! 1. Admits itself to the router under the path's address
//! 2. Relays inbound text/binary frames to the router
//! 3. Writes payloads from its outbound queue back to the socket
//! 4. Removes itself from the router when either side closes

use crate::actors::{AdmittedSession, Payload, SessionRouterHandle};
use crate::errors::RoomError;
use crate::models::ConnectParams;
use crate::observability::metrics;
use crate::routes::AppState;
use crate::services::AccessDecision;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use bytes::Bytes;
use common::types::RoomAddress;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Handler for GET /ws/{address}
///
/// # Errors
///
/// - 401 if no room exists and the key is not `public`
/// - 403 if the room exists and the key is wrong
/// - 400 if the attempt is allowed but is not a WebSocket upgrade
#[instrument(skip_all, name = "rooms.handler.connect")]
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    ws: Option<WebSocketUpgrade>,
) -> Result<Response, RoomError> {
    let params = ConnectParams::from_pairs(pairs);
    let presented_key = params.key.unwrap_or_default();
    let decision = state.access.authorize(&address, &presented_key).await;
    metrics::record_connect_attempt(decision.as_str());

    match decision {
        AccessDecision::Allow => {}
        AccessDecision::Unauthorized => {
            return Err(RoomError::Unauthorized("Room not found".to_string()));
        }
        AccessDecision::Forbidden => {
            return Err(RoomError::Forbidden("Invalid access key".to_string()));
        }
    }

    let Some(ws) = ws else {
        return Err(RoomError::BadRequest(
            "WebSocket upgrade required".to_string(),
        ));
    };

    let router = state.router.clone();
    let room_scope = RoomAddress::new(address);
    let max_message_bytes = state.config.max_message_bytes;

    Ok(ws
        .max_message_size(max_message_bytes)
        .max_frame_size(max_message_bytes)
        .on_upgrade(move |socket| run_session(socket, router, room_scope)))
}

/// Drive one upgraded connection until either side closes.
async fn run_session(socket: WebSocket, router: SessionRouterHandle, room_scope: RoomAddress) {
    let session = match router.admit(room_scope.clone()).await {
        Ok(session) => session,
        Err(e) => {
            error!(
                target: "rooms.session",
                room = %room_scope,
                error = %e,
                "Failed to admit session, closing connection"
            );
            return;
        }
    };

    info!(
        target: "rooms.session",
        session_id = %session.session_id,
        room = %session.room_scope,
        display_label = %session.display_label,
        "Session connected"
    );

    let session_id = session.session_id;
    relay(socket, session, &router).await;

    if let Err(e) = router.remove(session_id).await {
        warn!(
            target: "rooms.session",
            session_id = %session_id,
            error = %e,
            "Failed to remove session from router"
        );
    }

    info!(
        target: "rooms.session",
        session_id = %session_id,
        room = %room_scope,
        "Session disconnected"
    );
}

async fn relay(socket: WebSocket, mut session: AdmittedSession, router: &SessionRouterHandle) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outbound = session.outbound.recv() => {
                let Some(payload) = outbound else {
                    debug!(
                        target: "rooms.session",
                        session_id = %session.session_id,
                        "Router closed the outbound queue"
                    );
                    break;
                };
                let message = match payload {
                    Payload::Text(text) => Message::Text(text),
                    Payload::Binary(data) => Message::Binary(data.to_vec()),
                };
                if let Err(e) = sink.send(message).await {
                    debug!(
                        target: "rooms.session",
                        session_id = %session.session_id,
                        error = %e,
                        "Failed to write to socket"
                    );
                    break;
                }
            }

            inbound = stream.next() => {
                let payload = match inbound {
                    Some(Ok(Message::Text(text))) => Payload::Text(text),
                    Some(Ok(Message::Binary(data))) => Payload::Binary(Bytes::from(data)),
                    // Pongs are sent by the transport
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(
                            target: "rooms.session",
                            session_id = %session.session_id,
                            error = %e,
                            "Socket read failed"
                        );
                        break;
                    }
                };

                if let Err(e) = router.dispatch(session.session_id, payload).await {
                    warn!(
                        target: "rooms.session",
                        session_id = %session.session_id,
                        error = %e,
                        "Router unavailable, closing session"
                    );
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
}
