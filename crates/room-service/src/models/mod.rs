//! Room service models.
//!
//! Contains the room record owned by the registry and the JSON bodies
//! returned by the HTTP API.

use common::secret::{ExposeSecret, SecretString};
use common::types::RoomAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme of the invite URI handed to room creators.
pub const INVITE_URI_SCHEME: &str = "walletchat";

/// Build the invite URI for a room.
///
/// Pure function of the address and key; the registry recomputes it instead
/// of trusting a stored value that may be missing.
pub fn invite_uri_for(address: &RoomAddress, access_key: &str) -> String {
    format!("{}://{}?key={}", INVITE_URI_SCHEME, address, access_key)
}

/// A chat room.
///
/// Only the registry creates and stores these. The access key and the invite
/// URI (which embeds the key) are redacted from Debug output.
#[derive(Clone)]
pub struct Room {
    /// Public address, unique within the registry.
    pub address: RoomAddress,

    /// Secret required to join. Never changes once assigned.
    pub access_key: SecretString,

    /// `walletchat://{address}?key={access_key}`.
    pub invite_uri: String,

    /// Creation time in Unix seconds (UTC). Informational only.
    pub created_at: i64,
}

impl Room {
    /// Create a room record, deriving its invite URI.
    pub fn new(address: RoomAddress, access_key: SecretString, created_at: i64) -> Self {
        let invite_uri = invite_uri_for(&address, access_key.expose_secret());
        Self {
            address,
            access_key,
            invite_uri,
            created_at,
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("address", &self.address)
            .field("access_key", &"[REDACTED]")
            .field("invite_uri", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Response body for `POST /api/v1/rooms` and `GET /api/v1/rooms/{address}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    /// Public room address.
    pub address: String,

    /// Access key required to connect.
    pub access_key: String,

    /// Invite URI to share (e.g. as a QR code).
    pub invite_uri: String,

    /// Creation time in Unix seconds.
    pub created_at: i64,
}

impl From<&Room> for RoomResponse {
    fn from(room: &Room) -> Self {
        Self {
            address: room.address.to_string(),
            access_key: room.access_key.expose_secret().to_string(),
            invite_uri: room.invite_uri.clone(),
            created_at: room.created_at,
        }
    }
}

/// Response body of the wallet-client routes under `/api/contract`.
///
/// Older clients read the invite URI as `qr_string` and expect a `status`
/// marker on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractResponse {
    /// "success" on creation, omitted on lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    pub address: String,

    pub access_key: String,

    /// Same value as `invite_uri`.
    pub qr_string: String,
}

impl ContractResponse {
    /// Body for a room that was just created.
    pub fn created(room: &Room) -> Self {
        Self {
            status: Some("success".to_string()),
            ..Self::from(room)
        }
    }
}

impl From<&Room> for ContractResponse {
    fn from(room: &Room) -> Self {
        Self {
            status: None,
            address: room.address.to_string(),
            access_key: room.access_key.expose_secret().to_string(),
            qr_string: room.invite_uri.clone(),
        }
    }
}

/// Query parameters of `GET /ws/{address}`.
#[derive(Debug, Default)]
pub struct ConnectParams {
    /// Presented access key, or the literal `public` override.
    pub key: Option<String>,
}

impl ConnectParams {
    /// Pick the parameters out of decoded query pairs.
    ///
    /// A repeated `key` takes its first value; unknown parameters are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let key = pairs
            .into_iter()
            .find_map(|(name, value)| (name == "key").then_some(value));
        Self { key }
    }
}

/// Readiness check response.
///
/// Returned by the `/ready` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: String,

    /// Number of rooms in the registry.
    pub rooms: usize,

    /// Number of live sessions (omitted if the router did not answer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<usize>,
}
