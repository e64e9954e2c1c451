//! Escrow state machine: owner-selected asset, fulfiller-gated release,
//! proportional claims.
//!
//! ```text
//! States: {asset unset, asset set} x {unfulfilled, fulfilled}
//!   set_asset_reference : (*, *)           -> (asset set, *)   owner only
//!   fulfill_conditions  : (*, unfulfilled) -> (*, fulfilled)   fulfiller only
//!   claim               : requires (asset set, fulfilled)      anyone
//! ```

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::asset::{AssetBook, AssetRef, FungibleAsset, Transfer};
use crate::error::{EscrowError, Role, TransferError};
use crate::event::{ClaimReceipt, EscrowEvent};
use crate::identity::Identity;
use crate::recipient::{Recipient, Recipients};
use crate::Result;

/// Length of a derived escrow address, in bytes.
pub const ADDRESS_LEN: usize = 20;

const ADDRESS_DOMAIN: &[u8] = b"split-escrow/address/v1";

/// Persistent escrow fields.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct EscrowState {
    /// Account whose balance gets distributed.
    pub address: Identity,
    pub owner: Identity,
    pub conditions_fulfiller: Identity,
    pub conditions_fulfilled: bool,
    pub current_asset: Option<AssetRef>,
    pub recipients: Recipients,
}

/// Where an escrow stands on the way to being claimable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingAssetAndConditions,
    AwaitingAsset,
    AwaitingConditions,
    Claimable,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingAssetAndConditions => "awaiting asset and conditions",
            Self::AwaitingAsset => "awaiting asset",
            Self::AwaitingConditions => "awaiting conditions",
            Self::Claimable => "claimable",
        };
        f.write_str(s)
    }
}

/// A proportional split escrow.
///
/// All mutation goes through `&mut self`; see [`crate::SharedEscrow`] for
/// use from several threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowLedger {
    state: EscrowState,
    events: Vec<EscrowEvent>,
}

impl EscrowLedger {
    /// Creates an escrow owned by `caller`, at an address derived from its
    /// parameters.
    ///
    /// # Errors
    ///
    /// [`EscrowError::InvalidConfiguration`] if `recipients` is empty, has a
    /// zero proportion, or does not sum to 100.
    pub fn new(caller: &Identity, recipients: Vec<Recipient>, fulfiller: Identity) -> Result<Self> {
        Self::with_salt(caller, recipients, fulfiller, 0)
    }

    /// Like [`EscrowLedger::new`], with `salt` mixed into the derived address
    /// so one owner can run several escrows with identical parameters.
    pub fn with_salt(
        caller: &Identity,
        recipients: Vec<Recipient>,
        fulfiller: Identity,
        salt: u64,
    ) -> Result<Self> {
        let recipients = Recipients::new(recipients)?;
        let address = derive_address(caller, &fulfiller, &recipients, salt);
        Ok(Self::from_parts(address, caller.clone(), fulfiller, recipients))
    }

    /// Creates an escrow holding funds at an explicitly chosen `address`.
    pub fn with_address(
        caller: &Identity,
        recipients: Vec<Recipient>,
        fulfiller: Identity,
        address: Identity,
    ) -> Result<Self> {
        let recipients = Recipients::new(recipients)?;
        Ok(Self::from_parts(address, caller.clone(), fulfiller, recipients))
    }

    fn from_parts(
        address: Identity,
        owner: Identity,
        conditions_fulfiller: Identity,
        recipients: Recipients,
    ) -> Self {
        info!(
            %address,
            %owner,
            fulfiller = %conditions_fulfiller,
            recipients = recipients.len(),
            "escrow created"
        );
        Self {
            state: EscrowState {
                address,
                owner,
                conditions_fulfiller,
                conditions_fulfilled: false,
                current_asset: None,
                recipients,
            },
            events: Vec::new(),
        }
    }

    /// Rebuilds a ledger from a previously saved state.
    pub fn restore(state: EscrowState) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &EscrowState {
        &self.state
    }

    pub fn into_state(self) -> EscrowState {
        self.state
    }

    pub fn address(&self) -> &Identity {
        &self.state.address
    }

    pub fn owner(&self) -> &Identity {
        &self.state.owner
    }

    pub fn conditions_fulfiller(&self) -> &Identity {
        &self.state.conditions_fulfiller
    }

    pub fn conditions_fulfilled(&self) -> bool {
        self.state.conditions_fulfilled
    }

    pub fn current_asset(&self) -> Option<&AssetRef> {
        self.state.current_asset.as_ref()
    }

    pub fn recipients(&self) -> &Recipients {
        &self.state.recipients
    }

    pub fn phase(&self) -> Phase {
        match (
            self.state.current_asset.is_some(),
            self.state.conditions_fulfilled,
        ) {
            (false, false) => Phase::AwaitingAssetAndConditions,
            (false, true) => Phase::AwaitingAsset,
            (true, false) => Phase::AwaitingConditions,
            (true, true) => Phase::Claimable,
        }
    }

    /// Drains events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<EscrowEvent> {
        std::mem::take(&mut self.events)
    }

    fn authorize(&self, caller: &Identity, role: Role) -> Result<()> {
        let holder = match role {
            Role::Owner => &self.state.owner,
            Role::ConditionsFulfiller => &self.state.conditions_fulfiller,
        };
        if caller == holder {
            Ok(())
        } else {
            warn!(%caller, %role, "unauthorized escrow call");
            Err(EscrowError::Unauthorized(role))
        }
    }

    /// Points the escrow at `asset`. Owner only.
    ///
    /// Balances are not touched: whatever the escrow holds in the previous
    /// asset stays there and becomes claimable again once it is reselected.
    pub fn set_asset_reference(&mut self, caller: &Identity, asset: AssetRef) -> Result<()> {
        self.authorize(caller, Role::Owner)?;

        let previous = self.state.current_asset.replace(asset.clone());
        info!(%asset, "asset reference set");
        self.events.push(EscrowEvent::AssetReferenceSet {
            previous,
            current: asset,
        });
        Ok(())
    }

    /// Marks the release conditions as met. Fulfiller only.
    ///
    /// There is no way back. Calling again once fulfilled does nothing.
    pub fn fulfill_conditions(&mut self, caller: &Identity) -> Result<()> {
        self.authorize(caller, Role::ConditionsFulfiller)?;

        if self.state.conditions_fulfilled {
            debug!("conditions already fulfilled");
            return Ok(());
        }
        self.state.conditions_fulfilled = true;
        info!("conditions fulfilled");
        self.events.push(EscrowEvent::ConditionsFulfilled);
        Ok(())
    }

    /// Computes what [`EscrowLedger::claim`] would pay out right now.
    ///
    /// # Errors
    ///
    /// [`EscrowError::AssetNotConfigured`], then
    /// [`EscrowError::ConditionsNotFulfilled`], in that order.
    pub fn preview_claim<B: AssetBook>(&self, book: &B) -> Result<ClaimReceipt> {
        let asset = self
            .state
            .current_asset
            .as_ref()
            .ok_or(EscrowError::AssetNotConfigured)?;
        if !self.state.conditions_fulfilled {
            return Err(EscrowError::ConditionsNotFulfilled);
        }

        let balance = book.balance_of(asset, &self.state.address);
        let split = self.state.recipients.split(balance);
        Ok(ClaimReceipt {
            asset: asset.clone(),
            balance,
            payouts: split.payouts,
            remainder: split.remainder,
        })
    }

    /// Distributes the escrow's whole current balance of the selected asset.
    /// Anyone may call.
    ///
    /// The balance is read from `book` on every call. Either every
    /// recipient transfer of this call goes through or none does.
    pub fn claim<B: AssetBook>(&mut self, caller: &Identity, book: &mut B) -> Result<ClaimReceipt> {
        let receipt = match self.preview_claim(&*book) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(%caller, error = %e, "claim rejected");
                return Err(e);
            }
        };

        let transfers: Vec<Transfer> = receipt
            .payouts
            .iter()
            .filter(|p| p.amount > 0)
            .map(|p| Transfer {
                to: p.recipient.clone(),
                amount: p.amount,
            })
            .collect();

        if !transfers.is_empty() {
            let token = book
                .asset_mut(&receipt.asset)
                .ok_or_else(|| TransferError::UnknownAsset(receipt.asset.clone()))?;
            if let Err(e) = token.transfer_batch(&self.state.address, &transfers) {
                warn!(%caller, asset = %receipt.asset, error = %e, "claim transfer failed");
                return Err(e.into());
            }
        }

        for payout in &receipt.payouts {
            debug!(recipient = %payout.recipient, amount = payout.amount, "payout");
        }
        info!(
            %caller,
            asset = %receipt.asset,
            balance = receipt.balance,
            remainder = receipt.remainder,
            "claim distributed"
        );
        self.events.push(EscrowEvent::Claimed(receipt.clone()));
        Ok(receipt)
    }

    /// Encodes the persistent state with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(&self.state, bincode::config::standard())
            .map_err(|e| EscrowError::Encoding(e.to_string()))
    }

    /// Decodes a ledger from [`EscrowLedger::to_bytes`] output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (state, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| EscrowError::Encoding(e.to_string()))?;
        Ok(Self::restore(state))
    }
}

/// Address an escrow with these parameters lives at: the first
/// [`ADDRESS_LEN`] bytes of a SHA-256 over the length-prefixed parameters.
pub fn derive_address(
    owner: &Identity,
    fulfiller: &Identity,
    recipients: &Recipients,
    salt: u64,
) -> Identity {
    let mut hasher = Sha256::new();
    hasher.update(ADDRESS_DOMAIN);
    for id in [owner, fulfiller] {
        hasher.update((id.as_bytes().len() as u64).to_le_bytes());
        hasher.update(id.as_bytes());
    }
    hasher.update((recipients.len() as u64).to_le_bytes());
    for r in recipients {
        hasher.update((r.address.as_bytes().len() as u64).to_le_bytes());
        hasher.update(r.address.as_bytes());
        hasher.update([r.proportion]);
    }
    hasher.update(salt.to_le_bytes());
    let digest = hasher.finalize();
    Identity::from_bytes(&digest[..ADDRESS_LEN])
}
