//! Escrow creation parameters and JSON file helpers.

#[cfg(feature = "json")]
use std::fs::File;
#[cfg(feature = "json")]
use std::path::Path;

#[cfg(feature = "json")]
use anyhow::Context;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::escrow::EscrowLedger;
use crate::identity::Identity;
use crate::recipient::Recipient;
use crate::Result;

/// Default path to the escrow params template.
pub const ESCROW_PARAMS_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../templates/escrow_params.json"
);

/// Parameters supplied once, when the escrow is provisioned.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowParams {
    /// Who creates the escrow and may later select its asset.
    pub owner: Identity,

    /// Sole party allowed to unlock claims.
    pub conditions_fulfiller: Identity,

    /// Fixed recipients; proportions must sum to 100.
    pub recipients: Vec<Recipient>,

    /// Mixed into the derived escrow address.
    #[cfg_attr(feature = "json", serde(default))]
    pub salt: u64,
}

impl EscrowParams {
    /// Validates the parameters and creates the escrow they describe.
    pub fn build(&self) -> Result<EscrowLedger> {
        EscrowLedger::with_salt(
            &self.owner,
            self.recipients.clone(),
            self.conditions_fulfiller.clone(),
            self.salt,
        )
    }
}

/// Reads a JSON-encoded file from the given `path` and deserializes into type `T`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be opened, read, or parsed.
///
/// # Examples
///
/// ```ignore
/// # use split_escrow_core::params::{load_escrow_data, EscrowParams};
///
/// let _params: EscrowParams = load_escrow_data("./escrow_params.json").unwrap();
/// ```
#[cfg(feature = "json")]
pub fn load_escrow_data<P, T>(path: P) -> anyhow::Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("loading escrow data: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parsing JSON from {:?}", path))
}

/// Writes `data` (serializable) as pretty-printed JSON to the given `path`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be created or data cannot be serialized.
#[cfg(feature = "json")]
pub fn save_escrow_data<P, T>(path: P, data: &T) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating file {:?}", path))?;
    serde_json::to_writer_pretty(file, data)
        .with_context(|| format!("serializing to JSON to {:?}", path))
}
