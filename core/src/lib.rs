/// External fungible assets and asset references
pub mod asset;
/// Escrow state machine and proportional claims
pub mod escrow;
/// Records of successful escrow transitions
pub mod event;
/// Identities of parties and accounts
pub mod identity;
/// In-memory reference assets
pub mod memory;
/// Creation parameters and JSON helpers
pub mod params;
/// Recipients and split arithmetic
pub mod recipient;
/// Lock-guarded escrow handle
pub mod shared;

pub mod error;

pub use asset::{AssetBook, AssetRef, FungibleAsset, Transfer};
pub use error::{ConfigError, EscrowError, IdentityError, Role, TransferError};
pub use escrow::{EscrowLedger, EscrowState, Phase};
pub use event::{ClaimReceipt, EscrowEvent};
pub use identity::Identity;
pub use memory::{MemoryAssets, MemoryToken};
pub use params::EscrowParams;
pub use recipient::{Payout, Recipient, Recipients};
pub use shared::SharedEscrow;

pub type Result<T> = std::result::Result<T, EscrowError>;
