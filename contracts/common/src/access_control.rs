//! Access Control Module
//!
//! Capability checks for the staking pool. Administrative operations compare
//! the caller against the authority stored in the pool (or the pinned program
//! authority for pool creation); depositor operations compare against the
//! entry owner. There are no roles beyond these two.

use crate::errors::{StakingError, StakingResult};
use crate::types::{Address, PoolState, StakeEntry};

/// Require `caller == expected`
pub fn require_identity(expected: &Address, caller: &Address) -> StakingResult<()> {
    if expected != caller {
        return Err(StakingError::Unauthorized {
            expected: *expected,
            actual: *caller,
        });
    }
    Ok(())
}

/// Require the pool authority for an administrative operation
pub fn require_authority(pool: &PoolState, caller: &Address) -> StakingResult<()> {
    require_identity(&pool.authority, caller)
}

/// Require the entry owner for a depositor operation
pub fn require_owner(entry: &StakeEntry, caller: &Address) -> StakingResult<()> {
    require_identity(&entry.owner, caller)
}

/// Require the pinned program authority, when one is configured
pub fn require_program_authority(pinned: Option<&Address>, caller: &Address) -> StakingResult<()> {
    match pinned {
        Some(expected) => require_identity(expected, caller),
        None => Ok(()),
    }
}
