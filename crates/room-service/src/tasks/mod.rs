//! Background tasks for the Room service.
//!
//! # Components
//!
//! - `snapshot_writer` - Write-behind persistence of the room registry

pub mod snapshot_writer;

pub use snapshot_writer::{load_initial_snapshot, SnapshotWriterHandle};
