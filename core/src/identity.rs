//! Identities of the parties (and accounts) taking part in an escrow.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::IdentityError;

/// Textual form an identity was parsed from, kept so it prints back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Encoding {
    /// `0x`-prefixed hex (EVM-style addresses).
    Hex,
    /// Base58 (Solana-style public keys).
    Base58,
}

/// Opaque account identifier.
///
/// Two identities are equal when their bytes are equal, regardless of the
/// textual encoding they were parsed from.
///
/// ```
/// use split_escrow_core::Identity;
///
/// let id: Identity = "0xEA674fdDe714fd979de3EdF0F56AA9716B898ec8".parse().unwrap();
/// assert_eq!(id.as_bytes().len(), 20);
/// assert_eq!(id.to_string(), "0xea674fdde714fd979de3edf0f56aa9716b898ec8");
/// ```
#[cfg_attr(feature = "json", derive(SerializeDisplay, DeserializeFromStr))]
#[derive(Debug, Clone, Encode, Decode)]
pub struct Identity {
    bytes: Vec<u8>,
    encoding: Encoding,
}

impl Identity {
    /// Identity over raw bytes, printed as hex.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            encoding: Encoding::Hex,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl PartialOrd for Identity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl std::str::FromStr for Identity {
    type Err = IdentityError;

    /// Parses `0x`-prefixed input as hex and anything else as base58.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (bytes, encoding) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(digits) => (hex::decode(digits)?, Encoding::Hex),
            None => (bs58::decode(s).into_vec()?, Encoding::Base58),
        };
        if bytes.is_empty() {
            return Err(IdentityError::EmptyIdentity);
        }
        Ok(Self { bytes, encoding })
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.encoding {
            Encoding::Hex => write!(f, "0x{}", hex::encode(&self.bytes)),
            Encoding::Base58 => write!(f, "{}", bs58::encode(&self.bytes).into_string()),
        }
    }
}
