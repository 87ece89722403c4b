//! Identifier types for rooms and sessions.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Public address of a room, and the scope a session is bound to.
///
/// Room addresses are generated as `0x` followed by hex digits, but any
/// path segment is a valid scope: a session joined through the public
/// override may be bound to an address that has no room behind it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomAddress(String);

impl RoomAddress {
    /// Wrap an address string.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RoomAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl From<&str> for RoomAddress {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl Borrow<str> for RoomAddress {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Process-local identifier for a connected session. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
