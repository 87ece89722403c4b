//! Room Service Library
//!
//! Ephemeral, access-controlled chat rooms addressed by random
//! pseudo-addresses:
//!
//! - Room creation with a random address and access key
//! - Access control for connect attempts (`public` override for addresses
//!   without a room)
//! - Real-time relay of WebSocket messages to every session in the same room
//! - Write-behind JSON snapshots of the room registry
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//!                        │
//!                        └──> actors/session_router.rs
//! ```
//!
//! # Modules
//!
//! - `actors` - Session router actor and its messages
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP and WebSocket request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Room record and API bodies
//! - `observability` - Metrics definitions
//! - `repositories` - Snapshot storage
//! - `routes` - Axum router setup
//! - `services` - Address generation, room registry, access control
//! - `tasks` - Snapshot writer background task

pub mod actors;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod tasks;
