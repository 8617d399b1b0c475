//! Identity types for custody participants
//!
//! Every identity and one-time token is a fixed 32-byte value so that the
//! authorization digest can pack them as fixed-width words with no encoding
//! ambiguity between adjacent fields.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::errors::TypesError;

/// Width in bytes of every identity word.
pub const WORD_LEN: usize = 32;

fn decode_word(s: &str) -> Result<[u8; WORD_LEN], TypesError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| TypesError::InvalidLength {
        expected: WORD_LEN,
        actual,
    })
}

fn hash_label(label: &str) -> [u8; WORD_LEN] {
    Sha256::digest(label.as_bytes()).into()
}

/// Identity of an account, vault, or service.
///
/// For the authorizer this is the raw Ed25519 verifying key. Other
/// participants may use any 32-byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; WORD_LEN]);

impl Address {
    /// All-zero address
    pub const ZERO: Address = Address([0u8; WORD_LEN]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; WORD_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic address from a label (SHA-256 of the label).
    pub fn derive(label: &str) -> Self {
        Self(hash_label(label))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; WORD_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_word(s).map(Self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One-time token accompanying a signed authorization.
///
/// Nonces carry no ordering; uniqueness is all that matters, so random or
/// label-derived values are equally valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nonce([u8; WORD_LEN]);

impl Nonce {
    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; WORD_LEN]) -> Self {
        Self(bytes)
    }

    /// Fresh random nonce from the OS entropy source.
    pub fn random() -> Self {
        let mut bytes = [0u8; WORD_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive a nonce from a UTF-8 label (SHA-256 of the label bytes).
    pub fn from_label(label: &str) -> Self {
        Self(hash_label(label))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; WORD_LEN] {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Nonce {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_word(s).map(Self)
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Execution network identifier, bound into every authorization digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(u64);

impl ChainId {
    /// Local development network
    pub const LOCAL_DEVNET: ChainId = ChainId(31337);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self::LOCAL_DEVNET
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
