use std::path::Path;

use error::Result;
use serde::{Deserialize, Serialize};
use split_escrow_core::params::{load_escrow_data, save_escrow_data};
use split_escrow_core::{
    AssetBook, AssetRef, ClaimReceipt, EscrowEvent, EscrowLedger, EscrowParams, EscrowState,
    FungibleAsset, Identity, MemoryAssets, Phase,
};

pub mod error;

/// A locally simulated escrow together with the tokens it is paid in.
///
/// The whole simulation is persisted as one JSON document between CLI runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// Persistent escrow fields.
    pub ledger: EscrowState,
    /// Every token the simulation knows about.
    #[serde(default)]
    pub assets: MemoryAssets,
    /// Events emitted by the escrow so far, oldest first.
    #[serde(default)]
    pub events: Vec<EscrowEvent>,
}

impl Simulation {
    /// Provisions a fresh escrow from `params`.
    pub fn create(params: &EscrowParams) -> Result<Self> {
        let ledger = params.build()?;
        Ok(Self {
            ledger: ledger.into_state(),
            assets: MemoryAssets::default(),
            events: Vec::new(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        load_escrow_data(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        save_escrow_data(path, self)
    }

    /// Account holding the escrowed funds.
    pub fn escrow_address(&self) -> &Identity {
        &self.ledger.address
    }

    pub fn phase(&self) -> Phase {
        EscrowLedger::restore(self.ledger.clone()).phase()
    }

    /// Creates `amount` units of `asset` for `to`, deploying the token on first use.
    pub fn mint(&mut self, asset: AssetRef, to: &Identity, amount: u128) -> Result<()> {
        self.assets.deploy(asset).mint(to, amount)?;
        Ok(())
    }

    /// Moves `amount` units of `asset` from `from` into the escrow.
    pub fn deposit(&mut self, asset: AssetRef, from: &Identity, amount: u128) -> Result<()> {
        let escrow = self.ledger.address.clone();
        self.assets.deploy(asset).transfer(from, &escrow, amount)?;
        Ok(())
    }

    pub fn set_asset(&mut self, caller: &Identity, asset: AssetRef) -> Result<()> {
        self.with_ledger(|ledger, _| ledger.set_asset_reference(caller, asset))
    }

    pub fn fulfill(&mut self, caller: &Identity) -> Result<()> {
        self.with_ledger(|ledger, _| ledger.fulfill_conditions(caller))
    }

    pub fn claim(&mut self, caller: &Identity) -> Result<ClaimReceipt> {
        self.with_ledger(|ledger, assets| ledger.claim(caller, assets))
    }

    pub fn balance(&self, asset: &AssetRef, holder: &Identity) -> u128 {
        self.assets.balance_of(asset, holder)
    }

    // Runs one ledger operation; state and events are only kept if it succeeds.
    fn with_ledger<R>(
        &mut self,
        op: impl FnOnce(&mut EscrowLedger, &mut MemoryAssets) -> split_escrow_core::Result<R>,
    ) -> Result<R> {
        let mut ledger = EscrowLedger::restore(self.ledger.clone());
        let out = op(&mut ledger, &mut self.assets)?;
        self.events.extend(ledger.take_events());
        self.ledger = ledger.into_state();
        Ok(out)
    }
}
