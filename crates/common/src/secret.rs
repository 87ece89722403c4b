//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Room access keys
//! are held as [`SecretString`] for their whole in-memory lifetime, so any
//! struct deriving `Debug` around one redacts it automatically and tracing
//! fields built with `?room` never leak it.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct JoinAttempt {
//!     address: String,
//!     key: SecretString,  // Safe: Debug shows "[REDACTED]"
//! }
//!
//! let attempt = JoinAttempt {
//!     address: "0x00112233445566778899".to_string(),
//!     key: SecretString::from("0b1c7a62-6f0e-4e38-9a55-1e0d5c4d3c2b"),
//! };
//!
//! println!("{:?}", attempt);
//!
//! // The raw value is only reachable through an explicit call
//! let key: &str = attempt.key.expose_secret();
//! assert!(key.starts_with("0b1c"));
//! ```
//!
//! # Where secrets are exposed
//!
//! `expose_secret()` is called only where the raw key is part of the output:
//! - building the room's invite URI
//! - the access check (constant-time comparison against the presented key)
//! - the API response returned to the room creator or a room lookup
//! - the snapshot record handed to the persistence layer

pub use secrecy::{ExposeSecret, SecretString};
