//! Room service business logic.
//!
//! # Components
//!
//! - `address_generator` - Random room addresses, access keys and display labels
//! - `room_registry` - Address → room mapping with write-behind persistence
//! - `access_control` - Connect attempt authorization

pub mod access_control;
pub mod address_generator;
pub mod room_registry;

pub use access_control::{AccessController, AccessDecision, PUBLIC_ACCESS_KEY};
pub use address_generator::AddressGenerator;
pub use room_registry::RoomRegistry;
