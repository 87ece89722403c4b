//! Room registry.
//!
//! Owns the address → room mapping. Lookups share the lock; creation and
//! snapshot loading take it exclusively.
//!
//! # Persistence
//!
//! Every creation hands a copy of all records to the snapshot writer and
//! returns without waiting for it. A crash between the insert and the write
//! loses that room; callers accept this window in exchange for never blocking
//! on disk.

use crate::models::Room;
use crate::observability::metrics;
use crate::repositories::{RoomRecord, RoomSnapshot};
use crate::services::address_generator::AddressGenerator;
use crate::tasks::SnapshotWriterHandle;
use common::types::RoomAddress;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Registry of all rooms known to this process.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomAddress, Room>>,
    generator: AddressGenerator,
    snapshots: Option<SnapshotWriterHandle>,
}

impl RoomRegistry {
    /// Create an empty registry.
    ///
    /// Without a snapshot writer the registry is purely in-memory.
    pub fn new(generator: AddressGenerator, snapshots: Option<SnapshotWriterHandle>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            generator,
            snapshots,
        }
    }

    /// Create a room with a fresh address and access key.
    ///
    /// A generated address that is already taken is redrawn; an existing room
    /// is never overwritten. Schedules a snapshot but does not wait for it.
    #[instrument(skip_all, name = "rooms.registry.create_room")]
    pub async fn create_room(&self) -> Room {
        let mut rooms = self.rooms.write().await;

        let address = loop {
            let candidate = self.generator.new_address();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
            warn!(
                target: "rooms.registry",
                address = %candidate,
                "Generated address already in use, drawing another"
            );
        };

        let room = Room::new(
            address.clone(),
            self.generator.new_access_key(),
            chrono::Utc::now().timestamp(),
        );
        rooms.insert(address, room.clone());

        // Downgrade so the copy is taken before any later create can insert,
        // keeping published snapshots in creation order.
        let rooms = rooms.downgrade();
        if let Some(snapshots) = &self.snapshots {
            snapshots.request_save(snapshot_of(&rooms));
        }
        drop(rooms);

        info!(
            target: "rooms.registry",
            address = %room.address,
            "Room created"
        );
        metrics::record_room_created();

        room
    }

    /// Look up a room by address.
    pub async fn lookup(&self, address: &str) -> Option<Room> {
        self.rooms.read().await.get(address).cloned()
    }

    /// Replace the registry contents with a loaded snapshot.
    ///
    /// Called once at startup before serving. Invite URIs are rederived from
    /// the address and key; if any stored value was missing or stale, the
    /// repaired snapshot is published for writing. Returns the number of rooms
    /// loaded.
    #[instrument(skip_all, name = "rooms.registry.load_snapshot")]
    pub async fn load_snapshot(&self, snapshot: RoomSnapshot) -> usize {
        let mut repaired = 0usize;
        let mut loaded = HashMap::with_capacity(snapshot.len());

        for (key, record) in snapshot {
            if record.address != key {
                warn!(
                    target: "rooms.registry",
                    key = %key,
                    address = %record.address,
                    "Snapshot record address differs from its key, using the key"
                );
            }
            let address = RoomAddress::new(key);
            if !record.has_current_invite_uri(&address) {
                if record.invite_uri.as_deref().is_some_and(|uri| !uri.is_empty()) {
                    warn!(
                        target: "rooms.registry",
                        address = %address,
                        "Stored invite URI does not match the room, rederiving it"
                    );
                }
                repaired += 1;
            }
            let room = record.into_room(address.clone());
            loaded.insert(address, room);
        }

        let count = loaded.len();
        let mut rooms = self.rooms.write().await;
        *rooms = loaded;

        if repaired > 0 {
            debug!(
                target: "rooms.registry",
                repaired,
                "Rederived invite URIs for loaded rooms"
            );
            let rooms = rooms.downgrade();
            if let Some(snapshots) = &self.snapshots {
                snapshots.request_save(snapshot_of(&rooms));
            }
        }

        info!(target: "rooms.registry", rooms = count, "Room registry loaded");
        count
    }

    /// Consistent copy of every room record.
    pub async fn records(&self) -> RoomSnapshot {
        snapshot_of(&*self.rooms.read().await)
    }

    /// Number of rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Whether the registry holds no rooms.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

fn snapshot_of(rooms: &HashMap<RoomAddress, Room>) -> RoomSnapshot {
    rooms
        .iter()
        .map(|(address, room)| (address.to_string(), RoomRecord::from(room)))
        .collect()
}
