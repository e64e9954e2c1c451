//! In-memory fungible assets: a reference [`AssetBook`] for local runs and tests.

use std::collections::{BTreeMap, BTreeSet};

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::asset::{AssetBook, AssetRef, FungibleAsset, Transfer};
use crate::error::TransferError;
use crate::identity::Identity;

/// A mintable token with per-holder balances.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MemoryToken {
    asset: AssetRef,
    total_supply: u128,
    balances: BTreeMap<Identity, u128>,
    /// Holders that refuse incoming transfers.
    #[cfg_attr(feature = "json", serde(default))]
    rejecting: BTreeSet<Identity>,
}

impl MemoryToken {
    pub fn new(asset: AssetRef) -> Self {
        Self {
            asset,
            total_supply: 0,
            balances: BTreeMap::new(),
            rejecting: BTreeSet::new(),
        }
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Makes every later transfer to `holder` fail with [`TransferError::Rejected`].
    pub fn reject_transfers_to(&mut self, holder: Identity) {
        self.rejecting.insert(holder);
    }

    pub fn accept_transfers_to(&mut self, holder: &Identity) {
        self.rejecting.remove(holder);
    }

    fn apply(
        &self,
        balances: &mut BTreeMap<Identity, u128>,
        from: &Identity,
        to: &Identity,
        amount: u128,
    ) -> Result<(), TransferError> {
        if self.rejecting.contains(to) {
            return Err(TransferError::Rejected {
                recipient: to.clone(),
            });
        }
        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                holder: from.clone(),
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = balances
            .get(to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        balances.insert(from.clone(), available - amount);
        balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl FungibleAsset for MemoryToken {
    fn balance_of(&self, holder: &Identity) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &Identity,
        to: &Identity,
        amount: u128,
    ) -> Result<(), TransferError> {
        let mut balances = self.balances.clone();
        self.apply(&mut balances, from, to, amount)?;
        self.balances = balances;
        Ok(())
    }

    fn mint(&mut self, to: &Identity, amount: u128) -> Result<(), TransferError> {
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        // cannot overflow: every balance is bounded by the total supply
        *self.balances.entry(to.clone()).or_default() += amount;
        self.total_supply = total_supply;
        Ok(())
    }

    /// Applies the batch to a staged copy and commits only if all transfers succeed.
    fn transfer_batch(
        &mut self,
        from: &Identity,
        transfers: &[Transfer],
    ) -> Result<(), TransferError> {
        let mut staged = self.balances.clone();
        for t in transfers {
            self.apply(&mut staged, from, &t.to, t.amount)?;
        }
        self.balances = staged;
        Ok(())
    }
}

/// Collection of [`MemoryToken`]s keyed by their asset reference.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct MemoryAssets {
    tokens: Vec<MemoryToken>,
}

impl MemoryAssets {
    /// Returns the token for `asset`, creating an empty one if needed.
    pub fn deploy(&mut self, asset: AssetRef) -> &mut MemoryToken {
        let index = match self.tokens.iter().position(|t| t.asset == asset) {
            Some(index) => index,
            None => {
                self.tokens.push(MemoryToken::new(asset));
                self.tokens.len() - 1
            }
        };
        &mut self.tokens[index]
    }

    pub fn tokens(&self) -> &[MemoryToken] {
        &self.tokens
    }
}

impl AssetBook for MemoryAssets {
    type Asset = MemoryToken;

    fn asset(&self, asset: &AssetRef) -> Option<&MemoryToken> {
        self.tokens.iter().find(|t| &t.asset == asset)
    }

    fn asset_mut(&mut self, asset: &AssetRef) -> Option<&mut MemoryToken> {
        self.tokens.iter_mut().find(|t| &t.asset == asset)
    }
}
