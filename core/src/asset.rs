//! External fungible assets and the references an escrow tracks them by.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::identity::Identity;

/// Reference to an external fungible asset (e.g., an ERC-20 contract).
///
/// Equality, ordering and hashing only look at the contract identity; the
/// symbol is a display label.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Encode, Decode)]
pub struct AssetRef {
    /// Contract/program identity of the asset.
    pub contract: Identity,
    /// Optional ticker, e.g. `DAI`.
    #[cfg_attr(feature = "json", serde(default, skip_serializing_if = "Option::is_none"))]
    pub symbol: Option<String>,
}

impl AssetRef {
    pub fn new(contract: Identity) -> Self {
        Self {
            contract,
            symbol: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }
}

impl PartialEq for AssetRef {
    fn eq(&self, other: &Self) -> bool {
        self.contract == other.contract
    }
}

impl Eq for AssetRef {}

impl Hash for AssetRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.contract.hash(state);
    }
}

impl PartialOrd for AssetRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssetRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.contract.cmp(&other.contract)
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{}@{}", symbol, self.contract),
            None => write!(f, "{}", self.contract),
        }
    }
}

/// A single outgoing movement of `amount` units to `to`.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub to: Identity,
    pub amount: u128,
}

/// Capabilities an escrow needs from an external fungible asset.
pub trait FungibleAsset {
    /// Current balance of `holder`.
    fn balance_of(&self, holder: &Identity) -> u128;

    /// Moves `amount` units from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Must fail without moving anything when `from` cannot cover `amount`
    /// or when `to` refuses the transfer.
    fn transfer(&mut self, from: &Identity, to: &Identity, amount: u128)
        -> Result<(), TransferError>;

    /// Creates `amount` new units owned by `to`.
    fn mint(&mut self, to: &Identity, amount: u128) -> Result<(), TransferError>;

    /// Moves every transfer in `transfers` out of `from`.
    ///
    /// The provided implementation rejects the batch up front if `from`
    /// cannot cover the total, then transfers in order. Assets that can
    /// fail mid-batch for other reasons (such as a rejecting recipient)
    /// should override it so the batch is applied all-or-nothing.
    fn transfer_batch(
        &mut self,
        from: &Identity,
        transfers: &[Transfer],
    ) -> Result<(), TransferError> {
        let needed = transfers
            .iter()
            .try_fold(0u128, |acc, t| acc.checked_add(t.amount))
            .ok_or(TransferError::Overflow)?;
        let available = self.balance_of(from);
        if needed > available {
            return Err(TransferError::InsufficientBalance {
                holder: from.clone(),
                needed,
                available,
            });
        }
        for t in transfers {
            self.transfer(from, &t.to, t.amount)?;
        }
        Ok(())
    }
}

/// Resolves asset references to the assets they designate.
pub trait AssetBook {
    type Asset: FungibleAsset;

    fn asset(&self, asset: &AssetRef) -> Option<&Self::Asset>;

    fn asset_mut(&mut self, asset: &AssetRef) -> Option<&mut Self::Asset>;

    /// Balance of `holder` in `asset`; unknown assets hold nothing.
    fn balance_of(&self, asset: &AssetRef, holder: &Identity) -> u128 {
        self.asset(asset).map_or(0, |a| a.balance_of(holder))
    }
}
