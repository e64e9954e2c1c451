use thiserror::Error;

use crate::asset::AssetRef;
use crate::identity::Identity;

/// Escrow-related errors.
///
/// Every variant describes a rejected operation; none of them leaves the
/// ledger in a partially updated state.
#[derive(Debug, Error, PartialEq)]
pub enum EscrowError {
    /// Recipient list rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// Caller does not hold the role the operation is gated on.
    #[error("{}", .0.denial())]
    Unauthorized(Role),

    #[error("token address is not set")]
    AssetNotConfigured,

    #[error("conditions are not yet fulfilled")]
    ConditionsNotFulfilled,

    /// The external asset refused one of the claim transfers.
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("escrow lock poisoned")]
    Poisoned,
}

/// The two fixed roles of an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Owner,
    ConditionsFulfiller,
}

impl Role {
    /// Message returned to a caller that lacks this role.
    pub fn denial(&self) -> &'static str {
        match self {
            Self::Owner => "caller is not the owner",
            Self::ConditionsFulfiller => "only conditions fulfiller can call this function",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::ConditionsFulfiller => write!(f, "conditions fulfiller"),
        }
    }
}

/// Errors raised while validating a recipient list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("recipient list is empty")]
    NoRecipients,

    #[error("recipient #{index} has a zero proportion")]
    ZeroProportion { index: usize },

    #[error("proportions must sum to 100 (got {0})")]
    ProportionSum(u32),
}

/// Errors that might occur while parsing into an [`Identity`].
#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("cannot parse identity from empty string")]
    EmptyIdentity,
}

/// Errors reported by an external asset when moving balances.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient balance for {holder}: needed {needed}, available {available}")]
    InsufficientBalance {
        holder: Identity,
        needed: u128,
        available: u128,
    },

    #[error("recipient {recipient} rejected the transfer")]
    Rejected { recipient: Identity },

    #[error("unknown asset {0}")]
    UnknownAsset(AssetRef),

    #[error("amount overflow")]
    Overflow,
}
