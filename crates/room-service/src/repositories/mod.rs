//! Persistence for the Room service.
//!
//! # Components
//!
//! - `snapshot` - Registry snapshot format and the stores that hold it

pub mod snapshot;

pub use snapshot::{
    InMemorySnapshotStore, JsonFileSnapshotStore, PersistenceError, RoomRecord, RoomSnapshot,
    SnapshotStore,
};
