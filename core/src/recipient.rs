//! Recipients and the proportional split of an escrow balance.
//!
//! ## Rounding
//!
//! Each recipient gets `floor(balance * proportion / 100)`. The remainder,
//! always smaller than the number of recipients, is not handed to anyone:
//! it stays with the escrow and is split again on the next claim. No value
//! is lost, only deferred, and no recipient is favoured by list position.

use bincode::de::{BorrowDecoder, Decoder};
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{BorrowDecode, Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::Identity;

/// Proportions are whole percentage points and must add up to this.
pub const TOTAL_PROPORTION: u32 = 100;

/// A party entitled to a fixed percentage of every claim.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Recipient {
    pub address: Identity,
    /// Percentage points, in `1..=100`.
    pub proportion: u8,
}

impl Recipient {
    pub fn new(address: Identity, proportion: u8) -> Self {
        Self {
            address,
            proportion,
        }
    }
}

/// Validated, ordered, non-empty recipient list whose proportions sum to 100.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "json",
    serde(try_from = "Vec<Recipient>", into = "Vec<Recipient>")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipients(Vec<Recipient>);

impl Recipients {
    /// Validates `list`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoRecipients`] if `list` is empty.
    /// - [`ConfigError::ZeroProportion`] for the first zero proportion.
    /// - [`ConfigError::ProportionSum`] if proportions do not sum to 100.
    pub fn new(list: Vec<Recipient>) -> Result<Self, ConfigError> {
        if list.is_empty() {
            return Err(ConfigError::NoRecipients);
        }
        if let Some(index) = list.iter().position(|r| r.proportion == 0) {
            return Err(ConfigError::ZeroProportion { index });
        }
        let sum: u32 = list.iter().map(|r| u32::from(r.proportion)).sum();
        if sum != TOTAL_PROPORTION {
            return Err(ConfigError::ProportionSum(sum));
        }
        Ok(Self(list))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Recipient> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a validated list.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits `balance` among recipients in list order.
    pub fn split(&self, balance: u128) -> Split {
        let payouts: Vec<Payout> = self
            .0
            .iter()
            .map(|r| Payout {
                recipient: r.address.clone(),
                proportion: r.proportion,
                amount: share_of(balance, r.proportion),
            })
            .collect();
        let distributed: u128 = payouts.iter().map(|p| p.amount).sum();
        Split {
            payouts,
            remainder: balance - distributed,
        }
    }
}

impl TryFrom<Vec<Recipient>> for Recipients {
    type Error = ConfigError;

    fn try_from(list: Vec<Recipient>) -> Result<Self, Self::Error> {
        Self::new(list)
    }
}

impl From<Recipients> for Vec<Recipient> {
    fn from(r: Recipients) -> Self {
        r.0
    }
}

impl<'a> IntoIterator for &'a Recipients {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Encode for Recipients {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.0.encode(encoder)
    }
}

// Decoding re-validates so a snapshot can never carry a malformed list.
impl<Context> Decode<Context> for Recipients {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let list = Vec::<Recipient>::decode(decoder)?;
        Self::new(list).map_err(|e| DecodeError::OtherString(e.to_string()))
    }
}

impl<'de, Context> BorrowDecode<'de, Context> for Recipients {
    fn borrow_decode<D: BorrowDecoder<'de, Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, DecodeError> {
        Self::decode(decoder)
    }
}

/// `floor(balance * proportion / 100)` without intermediate overflow.
///
/// With `balance = 100q + r` the product splits into `q * p`, which never
/// exceeds `balance`, plus `floor(r * p / 100)`.
pub fn share_of(balance: u128, proportion: u8) -> u128 {
    let p = u128::from(proportion);
    let total = u128::from(TOTAL_PROPORTION);
    (balance / total) * p + (balance % total) * p / total
}

/// One recipient's part of a split.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Payout {
    pub recipient: Identity,
    pub proportion: u8,
    pub amount: u128,
}

/// Result of splitting a balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// One entry per recipient, in list order.
    pub payouts: Vec<Payout>,
    /// Undistributed units carried forward to the next claim.
    pub remainder: u128,
}
