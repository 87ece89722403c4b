//! Message types for the session router actor.
//!
//! Request-reply messages carry a `respond_to` oneshot sender; fire-and-forget
//! messages do not.

use bytes::Bytes;
use common::types::{RoomAddress, SessionId};
use tokio::sync::{mpsc, oneshot};

/// A relayed message body. The frame kind is preserved end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    /// Body length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Messages handled by the `SessionRouterActor`.
#[derive(Debug)]
pub enum RouterMessage {
    /// Register a session bound to `room_scope`.
    Admit {
        room_scope: RoomAddress,
        respond_to: oneshot::Sender<AdmittedSession>,
    },

    /// Fan a payload out to every session sharing the sender's scope.
    Dispatch { from: SessionId, payload: Payload },

    /// Forget a session after its connection closed.
    Remove { session_id: SessionId },

    /// Report live session counts.
    GetStatus {
        respond_to: oneshot::Sender<RouterStatus>,
    },
}

/// A session admitted by the router.
#[derive(Debug)]
pub struct AdmittedSession {
    pub session_id: SessionId,

    /// Room address fixed at admission.
    pub room_scope: RoomAddress,

    /// Cosmetic label such as `User-3fa9`.
    pub display_label: String,

    /// Payloads routed to this session.
    pub outbound: mpsc::Receiver<Payload>,
}

/// Router status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouterStatus {
    /// Live sessions.
    pub sessions: usize,
    /// Distinct scopes with at least one session.
    pub scopes: usize,
}
