//! Room address, access key and display label generation.
//!
//! All values come from the OS CSPRNG (`ring::rand::SystemRandom`). Nothing
//! here checks uniqueness: with 80 bits per address, collisions are left to
//! the registry's insert path.

use common::secret::SecretString;
use common::types::RoomAddress;
use ring::rand::{SecureRandom, SystemRandom};

/// Prefix marking a generated room address.
pub const ADDRESS_PREFIX: &str = "0x";

/// Random bytes per room address (80 bits, 20 hex characters).
pub const ADDRESS_RANDOM_BYTES: usize = 10;

/// Prefix of a session display label.
pub const DISPLAY_LABEL_PREFIX: &str = "User-";

/// Random bytes per display label (4 hex characters).
const DISPLAY_LABEL_RANDOM_BYTES: usize = 2;

/// Generator for room and session identifiers.
#[derive(Clone)]
pub struct AddressGenerator {
    rng: SystemRandom,
}

impl Default for AddressGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Generate a room address: `0x` followed by 20 lowercase hex characters.
    #[must_use]
    pub fn new_address(&self) -> RoomAddress {
        let mut bytes = [0u8; ADDRESS_RANDOM_BYTES];
        self.fill(&mut bytes);
        RoomAddress::new(format!("{}{}", ADDRESS_PREFIX, hex::encode(bytes)))
    }

    /// Generate a room access key (UUID v4 text, 122 random bits).
    #[must_use]
    pub fn new_access_key(&self) -> SecretString {
        let mut bytes = [0u8; 16];
        self.fill(&mut bytes);
        let key = uuid::Builder::from_random_bytes(bytes).into_uuid();
        SecretString::from(key.hyphenated().to_string())
    }

    /// Generate a cosmetic session label such as `User-3fa9`. Not unique.
    #[must_use]
    pub fn new_display_label(&self) -> String {
        let mut bytes = [0u8; DISPLAY_LABEL_RANDOM_BYTES];
        self.fill(&mut bytes);
        format!("{}{}", DISPLAY_LABEL_PREFIX, hex::encode(bytes))
    }

    /// Fill `buf` from the CSPRNG.
    ///
    /// An entropy source failure is fatal to the process. `SystemRandom`
    /// reads from getrandom/urandom, which only fails if the OS itself is
    /// broken; no caller could recover from that.
    #[allow(clippy::expect_used)]
    pub(crate) fn fill(&self, buf: &mut [u8]) {
        self.rng
            .fill(buf)
            .expect("CSPRNG should not fail on small buffers");
    }
}
