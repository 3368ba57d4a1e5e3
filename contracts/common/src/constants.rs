//! Protocol Constants
//!
//! Fixed-point scales, seeds and limits for the RND staking pool.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (a whole token as minimum stake)
//! - Default (no feature) - Testnet values (any non-zero stake)
//!
//! ```toml
//! # For mainnet deployment:
//! rnd-staking-common = { path = "...", features = ["mainnet"] }
//! ```

/// Token Metadata
pub mod token {
    /// One unit with decimals (1 RND = 1_000_000 base units)
    pub const ONE: u64 = 1_000_000;
}

/// Fixed-point scales
pub mod precision {
    /// Scale of every token amount (`PoolState::amount`, `StakeEntry::balance`)
    pub const VALUE_SCALE: u64 = super::token::ONE;

    /// Scale of the distribution rate index (1e11)
    pub const RATE_SCALE: u128 = 100_000_000_000;

    /// Index value of a pool that has seen no growth yet
    pub const BASE_RATE: u128 = RATE_SCALE;

    /// Multiplier applied to the index each time it is rescaled
    pub const RESCALE_FACTOR: u128 = 1_000;

    /// A burn leaving the index below this rescales it (1e8)
    pub const RESCALE_THRESHOLD: u128 = RATE_SCALE / RESCALE_FACTOR;
}

/// Staking limits
///
/// Values differ between mainnet and testnet to allow easier testing.
pub mod limits {
    /// Minimum amount accepted by a single stake
    /// - Mainnet: 1 RND
    /// - Testnet: 1 base unit
    #[cfg(feature = "mainnet")]
    pub const MIN_STAKE: u64 = super::precision::VALUE_SCALE;
    #[cfg(not(feature = "mainnet"))]
    pub const MIN_STAKE: u64 = 1;
}

/// Address derivation seeds
pub mod seeds {
    /// Pool state record, per asset
    pub const STAKE_POOL_STATE: &[u8] = b"state";
    /// Stake entry record, per depositor per asset
    pub const STAKE_ENTRY: &[u8] = b"stake_entry";
    /// Token vault, per asset
    pub const VAULT: &[u8] = b"vault";
    /// Signer owning every vault
    pub const VAULT_AUTHORITY: &[u8] = b"vault_authority";
}
