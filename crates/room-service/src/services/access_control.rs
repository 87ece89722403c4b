//! Connection access control.
//!
//! Decides whether a connect attempt for `address` presenting `key` may
//! proceed:
//!
//! | Room exists | Presented key          | Decision       |
//! |-------------|------------------------|----------------|
//! | no          | `public` (exact case)  | `Allow`        |
//! | no          | anything else          | `Unauthorized` |
//! | yes         | the room's access key  | `Allow`        |
//! | yes         | anything else          | `Forbidden`    |
//!
//! The `public` override never creates a room and never applies to an
//! address that has one.
//!
//! # Security
//!
//! - **Comparison**: constant-time via `ring::hmac::verify` against a
//!   per-process key, so timing reveals neither key content nor length
//! - **Logging**: presented keys are never logged

use crate::services::address_generator::AddressGenerator;
use crate::services::room_registry::RoomRegistry;
use common::secret::ExposeSecret;
use ring::hmac;
use std::sync::Arc;
use tracing::debug;

/// Presented key that admits a connection to an address with no room.
pub const PUBLIC_ACCESS_KEY: &str = "public";

/// Outcome of a connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Proceed with the connection.
    Allow,
    /// No room at the address and no public override.
    Unauthorized,
    /// Room exists, presented key does not match.
    Forbidden,
}

impl AccessDecision {
    /// Metric label for this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessDecision::Allow => "allow",
            AccessDecision::Unauthorized => "unauthorized",
            AccessDecision::Forbidden => "forbidden",
        }
    }
}

/// Validates connect attempts against the room registry.
pub struct AccessController {
    registry: Arc<RoomRegistry>,
    comparison_key: hmac::Key,
}

impl AccessController {
    /// Create a controller with a fresh per-process comparison key.
    pub fn new(registry: Arc<RoomRegistry>, generator: &AddressGenerator) -> Self {
        let mut key_bytes = [0u8; 32];
        generator.fill(&mut key_bytes);

        Self {
            registry,
            comparison_key: hmac::Key::new(hmac::HMAC_SHA256, &key_bytes),
        }
    }

    /// Decide whether a connection to `address` presenting `presented_key`
    /// may proceed.
    pub async fn authorize(&self, address: &str, presented_key: &str) -> AccessDecision {
        let Some(room) = self.registry.lookup(address).await else {
            let decision = if presented_key == PUBLIC_ACCESS_KEY {
                AccessDecision::Allow
            } else {
                AccessDecision::Unauthorized
            };
            debug!(
                target: "rooms.access",
                address = %address,
                decision = decision.as_str(),
                "Connect attempt for address without a room"
            );
            return decision;
        };

        if self.keys_match(room.access_key.expose_secret(), presented_key) {
            AccessDecision::Allow
        } else {
            debug!(
                target: "rooms.access",
                address = %address,
                "Connect attempt with wrong access key"
            );
            AccessDecision::Forbidden
        }
    }

    fn keys_match(&self, expected: &str, presented: &str) -> bool {
        let tag = hmac::sign(&self.comparison_key, expected.as_bytes());
        hmac::verify(&self.comparison_key, presented.as_bytes(), tag.as_ref()).is_ok()
    }
}
