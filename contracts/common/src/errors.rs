//! Error Types for the RND Staking Pool
//!
//! Typed errors with stable codes for logging and front ends.
//! Every precondition is checked before custody is touched, so a returned
//! error always means nothing was committed.

use crate::types::Address;

/// Result type alias for staking operations
pub type StakingResult<T> = Result<T, StakingError>;

/// Main error enum for all staking errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StakingError {
    // ============ Lifecycle Errors ============
    /// Pool already exists for this asset
    #[error("pool already initialized")]
    AlreadyInitialized,

    /// No pool exists at the given address
    #[error("pool not found")]
    PoolNotFound,

    /// No stake entry exists for this depositor
    #[error("stake entry not found")]
    EntryNotFound,

    /// Entry has no balance to unstake
    #[error("nothing staked")]
    NothingStaked,

    /// Entry belongs to a different pool
    #[error("entry asset does not match pool asset")]
    AssetMismatch,

    // ============ Authorization Errors ============
    /// Caller is not authorized for this operation
    #[error("unauthorized: expected {}, got {}", hex::encode(.expected), hex::encode(.actual))]
    Unauthorized { expected: Address, actual: Address },

    // ============ Amount Errors ============
    /// Zero amount not allowed
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Amount below configured minimum
    #[error("amount {amount} below minimum {minimum}")]
    BelowMinimum { amount: u64, minimum: u64 },

    /// Distribute on a pool with nothing staked
    #[error("pool is empty")]
    EmptyPool,

    /// Depositor's external account cannot cover the stake
    #[error("insufficient external balance: available {available}, requested {requested}")]
    InsufficientExternalBalance { available: u64, requested: u64 },

    /// Distribution too small to move the index at its current precision
    #[error("distribution of {amount} too small for pool amount {pool_amount}")]
    DistributionTooSmall { amount: u64, pool_amount: u64 },

    /// Pool amount cannot cover a payout or burn
    #[error("insufficient pool balance: available {available}, required {required}")]
    InsufficientPoolBalance { available: u64, required: u64 },

    // ============ Custody Errors ============
    /// Custody refused to move value for this account
    #[error("custody rejected transfer for {}", hex::encode(.account))]
    TransferRejected { account: Address },

    // ============ Math Errors ============
    /// Fixed-point result exceeds the representable range
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    // ============ Input Errors ============
    /// Operation bytes could not be decoded
    #[error("invalid instruction")]
    InvalidInstruction,

    /// Stored record has the wrong kind or cannot be decoded
    #[error("corrupt record")]
    CorruptRecord,

    /// Configuration value rejected
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl StakingError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "E001_ALREADY_INITIALIZED",
            Self::PoolNotFound => "E002_POOL_NOT_FOUND",
            Self::EntryNotFound => "E003_ENTRY_NOT_FOUND",
            Self::NothingStaked => "E004_NOTHING_STAKED",
            Self::AssetMismatch => "E005_ASSET_MISMATCH",
            Self::Unauthorized { .. } => "E020_UNAUTHORIZED",
            Self::ZeroAmount => "E030_ZERO_AMOUNT",
            Self::BelowMinimum { .. } => "E031_BELOW_MINIMUM",
            Self::EmptyPool => "E032_EMPTY_POOL",
            Self::InsufficientExternalBalance { .. } => "E033_INSUFFICIENT_EXTERNAL",
            Self::InsufficientPoolBalance { .. } => "E034_POOL_INSUFFICIENT",
            Self::DistributionTooSmall { .. } => "E035_DISTRIBUTION_TOO_SMALL",
            Self::TransferRejected { .. } => "E070_TRANSFER_REJECTED",
            Self::ArithmeticOverflow => "E080_OVERFLOW",
            Self::InvalidInstruction => "E090_INVALID_INSTRUCTION",
            Self::CorruptRecord => "E091_CORRUPT_RECORD",
            Self::InvalidConfig(_) => "E092_INVALID_CONFIG",
        }
    }

    /// Returns true if this error is recoverable (caller can fix it and resubmit)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientExternalBalance { .. } => true, // Top up funds
            Self::BelowMinimum { .. } => true,                // Increase amount
            Self::EmptyPool => true,                          // Wait for stakers
            Self::DistributionTooSmall { .. } => true,        // Distribute more at once
            Self::EntryNotFound => true,                      // Open the entry first
            _ => false,
        }
    }
}
