//! `SessionRouterActor` - owner of all live sessions.
//!
//! Each admitted session is bound to the room scope it connected to and gets
//! a bounded outbound queue. A dispatched payload is copied into the queue of
//! every session in the sender's scope, the sender included.
//!
//! Delivery is best-effort per recipient: the actor uses `try_send`, so a full
//! or closed queue drops that one delivery and never delays the others.
//!
//! # Graceful Shutdown
//!
//! On cancellation the actor drops every outbound sender. Connection tasks see
//! their queue close and end their sessions.

use crate::errors::RoomError;
use crate::observability::metrics;
use crate::services::AddressGenerator;

use super::messages::{AdmittedSession, Payload, RouterMessage, RouterStatus};

use common::types::{RoomAddress, SessionId};
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default channel buffer size for the router mailbox.
const ROUTER_CHANNEL_BUFFER: usize = 1000;

/// Handle to the `SessionRouterActor`.
#[derive(Clone, Debug)]
pub struct SessionRouterHandle {
    sender: mpsc::Sender<RouterMessage>,
    cancel_token: CancellationToken,
}

impl SessionRouterHandle {
    /// Spawn a router actor and return a handle to it.
    ///
    /// # Arguments
    ///
    /// * `outbound_buffer` - Outbound queue depth per session (must be > 0)
    /// * `generator` - Source of session display labels
    /// * `cancel_token` - Token that stops the actor
    #[must_use]
    pub fn new(
        outbound_buffer: usize,
        generator: AddressGenerator,
        cancel_token: CancellationToken,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(ROUTER_CHANNEL_BUFFER);

        let actor = SessionRouterActor::new(
            receiver,
            cancel_token.clone(),
            outbound_buffer.max(1),
            generator,
        );

        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Admit a session into `room_scope`.
    ///
    /// Only call after access control allowed the connection.
    pub async fn admit(&self, room_scope: RoomAddress) -> Result<AdmittedSession, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RouterMessage::Admit {
                room_scope,
                respond_to: tx,
            })
            .await
            .map_err(|e| RoomError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))
    }

    /// Relay `payload` from session `from` to its scope.
    pub async fn dispatch(&self, from: SessionId, payload: Payload) -> Result<(), RoomError> {
        self.sender
            .send(RouterMessage::Dispatch { from, payload })
            .await
            .map_err(|e| RoomError::Internal(format!("channel send failed: {e}")))
    }

    /// Remove a session. Peers are not notified.
    pub async fn remove(&self, session_id: SessionId) -> Result<(), RoomError> {
        self.sender
            .send(RouterMessage::Remove { session_id })
            .await
            .map_err(|e| RoomError::Internal(format!("channel send failed: {e}")))
    }

    /// Get live session counts.
    pub async fn status(&self) -> Result<RouterStatus, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RouterMessage::GetStatus { respond_to: tx })
            .await
            .map_err(|e| RoomError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))
    }

    /// Stop the actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Router-side state of one session.
struct SessionEntry {
    room_scope: RoomAddress,
    outbound: mpsc::Sender<Payload>,
}

/// The `SessionRouterActor` implementation.
pub struct SessionRouterActor {
    receiver: mpsc::Receiver<RouterMessage>,
    cancel_token: CancellationToken,
    outbound_buffer: usize,
    generator: AddressGenerator,
    /// Live sessions by ID.
    sessions: HashMap<SessionId, SessionEntry>,
    /// Session IDs per scope. Scopes with no sessions are removed.
    scopes: HashMap<RoomAddress, HashSet<SessionId>>,
}

impl SessionRouterActor {
    fn new(
        receiver: mpsc::Receiver<RouterMessage>,
        cancel_token: CancellationToken,
        outbound_buffer: usize,
        generator: AddressGenerator,
    ) -> Self {
        Self {
            receiver,
            cancel_token,
            outbound_buffer,
            generator,
            sessions: HashMap::new(),
            scopes: HashMap::new(),
        }
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "rooms.actor.router")]
    async fn run(mut self) {
        info!(target: "rooms.router", "SessionRouterActor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "rooms.router",
                        sessions = self.sessions.len(),
                        "SessionRouterActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!(
                                target: "rooms.router",
                                "SessionRouterActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        // Dropping the outbound senders ends every connection task
        self.sessions.clear();
        self.scopes.clear();
        metrics::set_sessions_active(0);

        info!(target: "rooms.router", "SessionRouterActor stopped");
    }

    fn handle_message(&mut self, message: RouterMessage) {
        match message {
            RouterMessage::Admit {
                room_scope,
                respond_to,
            } => {
                let admitted = self.admit(room_scope);
                let session_id = admitted.session_id;
                if respond_to.send(admitted).is_err() {
                    // Connection went away before admission completed
                    self.remove(session_id);
                }
            }
            RouterMessage::Dispatch { from, payload } => self.dispatch(from, &payload),
            RouterMessage::Remove { session_id } => self.remove(session_id),
            RouterMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status());
            }
        }
    }

    fn admit(&mut self, room_scope: RoomAddress) -> AdmittedSession {
        let session_id = SessionId::new();
        let display_label = self.generator.new_display_label();
        let (outbound_tx, outbound_rx) = mpsc::channel(self.outbound_buffer);

        self.scopes
            .entry(room_scope.clone())
            .or_default()
            .insert(session_id);
        self.sessions.insert(
            session_id,
            SessionEntry {
                room_scope: room_scope.clone(),
                outbound: outbound_tx,
            },
        );
        metrics::set_sessions_active(self.sessions.len());

        debug!(
            target: "rooms.router",
            session_id = %session_id,
            room = %room_scope,
            display_label = %display_label,
            "Session admitted"
        );

        AdmittedSession {
            session_id,
            room_scope,
            display_label,
            outbound: outbound_rx,
        }
    }

    fn dispatch(&mut self, from: SessionId, payload: &Payload) {
        let Some(scope) = self.sessions.get(&from).map(|s| &s.room_scope) else {
            debug!(
                target: "rooms.router",
                session_id = %from,
                "Dispatch from unknown session ignored"
            );
            return;
        };

        let Some(members) = self.scopes.get(scope) else {
            return;
        };

        let mut dropped = 0usize;
        for member in members {
            let Some(entry) = self.sessions.get(member) else {
                continue;
            };
            match entry.outbound.try_send(payload.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped += 1;
                    warn!(
                        target: "rooms.router",
                        session_id = %member,
                        "Outbound queue full, dropping delivery"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Connection is closing; its Remove is on the way
                    dropped += 1;
                }
            }
        }

        debug!(
            target: "rooms.router",
            session_id = %from,
            room = %scope,
            recipients = members.len(),
            dropped,
            bytes = payload.len(),
            "Payload dispatched"
        );
        metrics::record_dispatch(dropped);
    }

    fn remove(&mut self, session_id: SessionId) {
        let Some(entry) = self.sessions.remove(&session_id) else {
            return;
        };

        if let Some(members) = self.scopes.get_mut(&entry.room_scope) {
            members.remove(&session_id);
            if members.is_empty() {
                self.scopes.remove(&entry.room_scope);
            }
        }
        metrics::set_sessions_active(self.sessions.len());

        debug!(
            target: "rooms.router",
            session_id = %session_id,
            room = %entry.room_scope,
            "Session removed"
        );
    }

    fn status(&self) -> RouterStatus {
        RouterStatus {
            sessions: self.sessions.len(),
            scopes: self.scopes.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;

    fn router(buffer: usize) -> SessionRouterHandle {
        SessionRouterHandle::new(buffer, AddressGenerator::new(), CancellationToken::new())
    }

    async fn recv(session: &mut AdmittedSession) -> Payload {
        tokio::time::timeout(Duration::from_secs(1), session.outbound.recv())
            .await
            .expect("delivery should arrive")
            .expect("queue should be open")
    }

    async fn assert_nothing_received(session: &mut AdmittedSession) {
        let result =
            tokio::time::timeout(Duration::from_millis(100), session.outbound.recv()).await;
        assert!(result.is_err(), "unexpected delivery: {:?}", result);
    }

    #[tokio::test]
    async fn test_admit_assigns_identity() {
        let router = router(8);
        let scope = RoomAddress::from("0xaa");

        let first = router.admit(scope.clone()).await.unwrap();
        let second = router.admit(scope.clone()).await.unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert_eq!(first.room_scope, scope);
        assert!(first.display_label.starts_with("User-"));

        let status = router.status().await.unwrap();
        assert_eq!(status, RouterStatus { sessions: 2, scopes: 1 });
    }

    #[tokio::test]
    async fn test_dispatch_reaches_scope_including_sender() {
        let router = router(8);
        let scope = RoomAddress::from("0xaa");
        let mut a = router.admit(scope.clone()).await.unwrap();
        let mut b = router.admit(scope).await.unwrap();

        router
            .dispatch(a.session_id, Payload::Text("hello".to_string()))
            .await
            .unwrap();
        router
            .dispatch(b.session_id, Payload::Binary(Bytes::from_static(&[1, 2, 3])))
            .await
            .unwrap();

        assert_eq!(recv(&mut a).await, Payload::Text("hello".to_string()));
        assert_eq!(recv(&mut b).await, Payload::Text("hello".to_string()));
        assert_eq!(
            recv(&mut a).await,
            Payload::Binary(Bytes::from_static(&[1, 2, 3]))
        );
        assert_eq!(
            recv(&mut b).await,
            Payload::Binary(Bytes::from_static(&[1, 2, 3]))
        );
    }

    #[tokio::test]
    async fn test_dispatch_does_not_cross_scopes() {
        let router = router(8);
        let mut a = router.admit(RoomAddress::from("0xaa")).await.unwrap();
        let mut other = router.admit(RoomAddress::from("0xbb")).await.unwrap();

        router
            .dispatch(a.session_id, Payload::Text("only aa".to_string()))
            .await
            .unwrap();

        assert_eq!(recv(&mut a).await, Payload::Text("only aa".to_string()));
        assert_nothing_received(&mut other).await;
    }

    #[tokio::test]
    async fn test_removed_session_gets_no_deliveries() {
        let router = router(8);
        let scope = RoomAddress::from("0xaa");
        let mut a = router.admit(scope.clone()).await.unwrap();
        let mut b = router.admit(scope).await.unwrap();

        router.remove(b.session_id).await.unwrap();
        router
            .dispatch(a.session_id, Payload::Text("after remove".to_string()))
            .await
            .unwrap();

        assert_eq!(recv(&mut a).await, Payload::Text("after remove".to_string()));
        // The router dropped b's sender, so its queue is closed and empty
        assert!(b.outbound.recv().await.is_none());

        let status = router.status().await.unwrap();
        assert_eq!(status, RouterStatus { sessions: 1, scopes: 1 });
    }

    #[tokio::test]
    async fn test_dispatch_from_removed_session_is_ignored() {
        let router = router(8);
        let scope = RoomAddress::from("0xaa");
        let a = router.admit(scope.clone()).await.unwrap();
        let mut b = router.admit(scope).await.unwrap();

        router.remove(a.session_id).await.unwrap();
        router
            .dispatch(a.session_id, Payload::Text("ghost".to_string()))
            .await
            .unwrap();

        assert_nothing_received(&mut b).await;
    }

    #[tokio::test]
    async fn test_full_queue_drops_only_that_delivery() {
        let router = router(1);
        let scope = RoomAddress::from("0xaa");
        let mut slow = router.admit(scope.clone()).await.unwrap();
        let mut fast = router.admit(scope).await.unwrap();

        router
            .dispatch(fast.session_id, Payload::Text("one".to_string()))
            .await
            .unwrap();
        assert_eq!(recv(&mut fast).await, Payload::Text("one".to_string()));

        // slow still holds "one", so "two" is dropped for it only
        router
            .dispatch(fast.session_id, Payload::Text("two".to_string()))
            .await
            .unwrap();
        assert_eq!(recv(&mut fast).await, Payload::Text("two".to_string()));

        assert_eq!(recv(&mut slow).await, Payload::Text("one".to_string()));
        assert_nothing_received(&mut slow).await;
    }

    #[tokio::test]
    async fn test_last_session_removes_scope() {
        let router = router(8);
        let a = router.admit(RoomAddress::from("0xaa")).await.unwrap();

        router.remove(a.session_id).await.unwrap();

        let status = router.status().await.unwrap();
        assert_eq!(status, RouterStatus::default());
    }

    #[tokio::test]
    async fn test_cancel_closes_outbound_queues() {
        let router = router(8);
        let mut a = router.admit(RoomAddress::from("0xaa")).await.unwrap();

        router.cancel();
        assert!(router.is_cancelled());

        let closed = tokio::time::timeout(Duration::from_secs(1), a.outbound.recv())
            .await
            .expect("queue should close after cancel");
        assert!(closed.is_none());
        assert!(router.status().await.is_err());
    }
}
