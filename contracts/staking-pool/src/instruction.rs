//! Instruction encoding.
//!
//! Front ends submit operations as CBOR-encoded [`StakingInstruction`]s; the
//! caller identity travels outside the payload and is supplied by the host.

use serde::{Deserialize, Serialize};

use rnd_staking_common::errors::{StakingError, StakingResult};
use rnd_staking_common::types::{AssetId, VaultRef};

/// The six mutating operations of the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakingInstruction {
    /// Create the pool for `asset_id`; the caller becomes its authority.
    InitPool { asset_id: AssetId, vault: VaultRef },
    /// Open the caller's entry in the pool.
    InitEntry { asset_id: AssetId },
    /// Move `amount` from the caller into the pool.
    Stake { asset_id: AssetId, amount: u64 },
    /// Pay out the caller's entry.
    Unstake { asset_id: AssetId },
    /// Inject `amount` of yield (authority only).
    Distribute { asset_id: AssetId, amount: u64 },
    /// Remove `amount` from the pool (authority only).
    Burn { asset_id: AssetId, amount: u64 },
}

impl StakingInstruction {
    /// Encode to CBOR.
    pub fn encode(&self) -> StakingResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|_| StakingError::InvalidInstruction)?;
        Ok(buf)
    }

    /// Decode from CBOR.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidInstruction`] for anything that is not a
    /// well-formed instruction.
    pub fn decode(bytes: &[u8]) -> StakingResult<Self> {
        ciborium::from_reader(bytes).map_err(|_| StakingError::InvalidInstruction)
    }

    /// Pool the instruction targets.
    pub fn asset_id(&self) -> &AssetId {
        match self {
            Self::InitPool { asset_id, .. }
            | Self::InitEntry { asset_id }
            | Self::Stake { asset_id, .. }
            | Self::Unstake { asset_id }
            | Self::Distribute { asset_id, .. }
            | Self::Burn { asset_id, .. } => asset_id,
        }
    }

    /// Operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitPool { .. } => "init_pool",
            Self::InitEntry { .. } => "init_entry",
            Self::Stake { .. } => "stake",
            Self::Unstake { .. } => "unstake",
            Self::Distribute { .. } => "distribute",
            Self::Burn { .. } => "burn",
        }
    }
}
