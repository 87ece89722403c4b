//! Room registry snapshot storage.
//!
//! The registry is persisted as a single JSON object mapping each address to
//! its record:
//!
//! ```json
//! {
//!   "0x00112233445566778899": {
//!     "address": "0x00112233445566778899",
//!     "access_key": "0b1c7a62-6f0e-4e38-9a55-1e0d5c4d3c2b",
//!     "created_at": 1700000000,
//!     "invite_uri": "walletchat://0x00112233445566778899?key=0b1c7a62-..."
//!   }
//! }
//! ```
//!
//! `invite_uri` is optional on read (older files lack it, or name it
//! `qr_string`). On load it is rederived from the map key and access key.

use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use common::types::RoomAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{invite_uri_for, Room};

/// Persisted form of the registry, keyed by address.
pub type RoomSnapshot = BTreeMap<String, RoomRecord>;

/// Snapshot load/save failure. Always recovered locally, never shown to clients.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// One persisted room.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub address: String,

    pub access_key: String,

    #[serde(default)]
    pub created_at: i64,

    #[serde(
        default,
        alias = "qr_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub invite_uri: Option<String>,
}

impl RoomRecord {
    /// Whether the stored invite URI is the one derived from `address` and
    /// this record's key.
    pub fn has_current_invite_uri(&self, address: &RoomAddress) -> bool {
        self.invite_uri.as_deref() == Some(invite_uri_for(address, &self.access_key).as_str())
    }

    /// Convert into a registry room, keyed by `address`.
    ///
    /// The invite URI is always derived from `address` and the key; a stored
    /// value that is missing, empty or stale is not carried over.
    pub fn into_room(self, address: RoomAddress) -> Room {
        Room::new(
            address,
            SecretString::from(self.access_key),
            self.created_at,
        )
    }
}

impl From<&Room> for RoomRecord {
    fn from(room: &Room) -> Self {
        Self {
            address: room.address.to_string(),
            access_key: room.access_key.expose_secret().to_string(),
            created_at: room.created_at,
            invite_uri: Some(room.invite_uri.clone()),
        }
    }
}

impl fmt::Debug for RoomRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomRecord")
            .field("address", &self.address)
            .field("access_key", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("invite_uri", &self.invite_uri.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Durable storage for registry snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the last saved snapshot. A store that was never written returns
    /// an empty snapshot.
    async fn load(&self) -> Result<RoomSnapshot, PersistenceError>;

    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &RoomSnapshot) -> Result<(), PersistenceError>;
}

/// Snapshot store backed by a pretty-printed JSON file.
///
/// Saves write a sibling temporary file and rename it over the target, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    async fn load(&self) -> Result<RoomSnapshot, PersistenceError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RoomSnapshot::new());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&data)?)
    }

    async fn save(&self, snapshot: &RoomSnapshot) -> Result<(), PersistenceError> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        let temp_path = self.temp_path();

        tokio::fs::write(&temp_path, data).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}

/// In-memory snapshot store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshot: Mutex<Option<RoomSnapshot>>,
    save_count: Mutex<usize>,
    failing: bool,
    save_delay: Option<Duration>,
}

impl InMemorySnapshotStore {
    /// Empty store that accepts every save.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `snapshot`.
    pub fn with_snapshot(snapshot: RoomSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Store whose loads and saves always fail.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Make every save take at least `delay`, like a slow disk.
    #[must_use]
    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = Some(delay);
        self
    }

    /// The most recently saved snapshot, if any.
    pub async fn saved(&self) -> Option<RoomSnapshot> {
        self.snapshot.lock().await.clone()
    }

    /// Number of successful saves.
    pub async fn save_count(&self) -> usize {
        *self.save_count.lock().await
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> Result<RoomSnapshot, PersistenceError> {
        if self.failing {
            return Err(PersistenceError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }
        Ok(self.snapshot.lock().await.clone().unwrap_or_default())
    }

    async fn save(&self, snapshot: &RoomSnapshot) -> Result<(), PersistenceError> {
        if let Some(delay) = self.save_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(PersistenceError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }
        *self.snapshot.lock().await = Some(snapshot.clone());
        *self.save_count.lock().await += 1;
        Ok(())
    }
}
