//! Records of successful escrow transitions.

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;
use crate::recipient::Payout;

/// Outcome of a successful claim.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ClaimReceipt {
    /// Asset the claim was paid in.
    pub asset: AssetRef,
    /// Escrow balance observed when the claim ran.
    pub balance: u128,
    /// Per-recipient amounts, in recipient order. Zero amounts were not transferred.
    pub payouts: Vec<Payout>,
    /// Units left in the escrow for the next claim.
    pub remainder: u128,
}

impl ClaimReceipt {
    /// Total units moved to recipients.
    pub fn distributed(&self) -> u128 {
        self.balance - self.remainder
    }
}

#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum EscrowEvent {
    AssetReferenceSet {
        previous: Option<AssetRef>,
        current: AssetRef,
    },
    ConditionsFulfilled,
    Claimed(ClaimReceipt),
}
