//! Ledger configuration.
//!
//! Loaded from TOML by the host; every field has a default so an empty file
//! is a valid configuration.
//!
//! ```toml
//! min_stake = 1000000
//! burn_policy = "socialized"
//! program_authority = "0909090909090909090909090909090909090909090909090909090909090909"
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::limits::MIN_STAKE;
use crate::errors::{StakingError, StakingResult};
use crate::types::Address;

/// How a burn affects the distribution rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnPolicy {
    /// Shrink the index so every entry carries its share of the loss.
    #[default]
    Socialized,
    /// Leave the index alone; the loss only reduces the pool amount.
    Absorbed,
}

/// Complete ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Smallest amount a single stake may move.
    #[serde(default = "default_min_stake")]
    pub min_stake: u64,
    /// Rate treatment of burns.
    #[serde(default)]
    pub burn_policy: BurnPolicy,
    /// Hex identity required to create pools. Empty = anyone.
    #[serde(default)]
    pub program_authority: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_stake: default_min_stake(),
            burn_policy: BurnPolicy::default(),
            program_authority: None,
        }
    }
}

fn default_min_stake() -> u64 {
    MIN_STAKE
}

impl LedgerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> StakingResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| StakingError::InvalidConfig(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot honour.
    pub fn validate(&self) -> StakingResult<()> {
        if self.min_stake == 0 {
            return Err(StakingError::InvalidConfig(
                "min_stake must be positive".to_string(),
            ));
        }
        self.program_authority()?;
        Ok(())
    }

    /// Decode the pinned program authority, if any.
    pub fn program_authority(&self) -> StakingResult<Option<Address>> {
        let Some(encoded) = self.program_authority.as_deref() else {
            return Ok(None);
        };
        if encoded.is_empty() {
            return Ok(None);
        }

        let bytes = hex::decode(encoded)
            .map_err(|e| StakingError::InvalidConfig(format!("program_authority: {e}")))?;
        let address: Address = bytes.try_into().map_err(|_| {
            StakingError::InvalidConfig("program_authority must be 32 bytes".to_string())
        })?;
        Ok(Some(address))
    }

    /// Builder-style override of the burn policy.
    pub fn with_burn_policy(mut self, burn_policy: BurnPolicy) -> Self {
        self.burn_policy = burn_policy;
        self
    }

    /// Builder-style pin of the program authority.
    pub fn with_program_authority(mut self, authority: &Address) -> Self {
        self.program_authority = Some(hex::encode(authority));
        self
    }
}
