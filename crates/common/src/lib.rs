//! Common types shared across the room relay crates.

#![warn(clippy::pedantic)]

/// Module for room and session identifier types
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;
