//! Thread-safe handle serializing every escrow operation behind one lock.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::asset::{AssetBook, AssetRef};
use crate::error::EscrowError;
use crate::escrow::{EscrowLedger, EscrowState, Phase};
use crate::event::{ClaimReceipt, EscrowEvent};
use crate::identity::Identity;
use crate::Result;

struct Inner<B> {
    ledger: EscrowLedger,
    assets: B,
}

/// An [`EscrowLedger`] and the asset book it pays out of, shared across threads.
///
/// The ledger and the assets sit under the same mutex, so a claim reads the
/// balance and transfers it without any other operation in between. Two
/// concurrent claims therefore never split the same balance twice.
pub struct SharedEscrow<B> {
    inner: Arc<Mutex<Inner<B>>>,
}

impl<B> Clone for SharedEscrow<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: AssetBook> SharedEscrow<B> {
    pub fn new(ledger: EscrowLedger, assets: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { ledger, assets })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<B>>> {
        self.inner.lock().map_err(|_| EscrowError::Poisoned)
    }

    pub fn set_asset_reference(&self, caller: &Identity, asset: AssetRef) -> Result<()> {
        self.lock()?.ledger.set_asset_reference(caller, asset)
    }

    pub fn fulfill_conditions(&self, caller: &Identity) -> Result<()> {
        self.lock()?.ledger.fulfill_conditions(caller)
    }

    pub fn claim(&self, caller: &Identity) -> Result<ClaimReceipt> {
        let mut guard = self.lock()?;
        let Inner { ledger, assets } = &mut *guard;
        ledger.claim(caller, assets)
    }

    pub fn preview_claim(&self) -> Result<ClaimReceipt> {
        let guard = self.lock()?;
        guard.ledger.preview_claim(&guard.assets)
    }

    /// Runs `f` on the asset book under the escrow lock, e.g. to deposit funds.
    pub fn with_assets<R>(&self, f: impl FnOnce(&mut B) -> R) -> Result<R> {
        Ok(f(&mut self.lock()?.assets))
    }

    pub fn address(&self) -> Result<Identity> {
        Ok(self.lock()?.ledger.address().clone())
    }

    pub fn phase(&self) -> Result<Phase> {
        Ok(self.lock()?.ledger.phase())
    }

    pub fn snapshot(&self) -> Result<EscrowState> {
        Ok(self.lock()?.ledger.state().clone())
    }

    pub fn take_events(&self) -> Result<Vec<EscrowEvent>> {
        Ok(self.lock()?.ledger.take_events())
    }
}
