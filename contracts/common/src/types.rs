//! Core Types for the RND Staking Pool
//!
//! The two persisted records - [`PoolState`] and [`StakeEntry`] - and the
//! identity aliases shared by every crate in the workspace.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::precision::BASE_RATE;
use crate::errors::{StakingError, StakingResult};

/// Type alias for addresses (32-byte public key)
pub type Address = [u8; 32];

/// Type alias for staked asset identifiers (the token mint)
pub type AssetId = [u8; 32];

/// Type alias for custody vault references
pub type VaultRef = [u8; 32];

// ============ Record Kinds ============

/// Discriminator prefixed to every stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum RecordKind {
    /// Pool aggregate
    PoolState = 0x01,
    /// Depositor entry
    StakeEntry = 0x02,
}

/// Encode a record behind its one-byte kind discriminator
fn encode_record<T: BorshSerialize>(kind: RecordKind, record: &T) -> StakingResult<Vec<u8>> {
    let mut bytes = vec![kind as u8];
    record
        .serialize(&mut bytes)
        .map_err(|_| StakingError::CorruptRecord)?;
    Ok(bytes)
}

/// Decode a record, rejecting bytes stored under another kind
fn decode_record<T: BorshDeserialize>(kind: RecordKind, bytes: &[u8]) -> StakingResult<T> {
    match bytes.split_first() {
        Some((tag, body)) if *tag == kind as u8 => {
            borsh::from_slice(body).map_err(|_| StakingError::CorruptRecord)
        }
        _ => Err(StakingError::CorruptRecord),
    }
}

// ============ Pool Types ============

/// Aggregate state of one staked-asset pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolState {
    /// Identity allowed to distribute and burn (fixed at init)
    pub authority: Address,
    /// Staked asset
    pub asset_id: AssetId,
    /// Custody vault holding staked and distributed value
    pub vault: VaultRef,
    /// Value attributable to open entries (base units)
    pub amount: u64,
    /// Cumulative compounding index (scaled by RATE_SCALE)
    pub distribution_rate: u128,
    /// Incremented when a burn wipes the index out
    pub epoch: u64,
    /// Number of times the index was multiplied by `RESCALE_FACTOR` this epoch
    pub scale: u64,
    /// Number of entries ever opened against this pool
    pub entry_count: u64,
    /// Cumulative amount staked
    pub total_staked: u64,
    /// Cumulative yield distributed
    pub total_distributed: u64,
    /// Cumulative loss burned
    pub total_burned: u64,
    /// Cumulative payouts to depositors
    pub total_withdrawn: u64,
    /// Host logical time of initialization
    pub initialized_at: u64,
}

impl PoolState {
    /// Creates an empty pool at the base rate
    pub fn new(authority: Address, asset_id: AssetId, vault: VaultRef, initialized_at: u64) -> Self {
        Self {
            authority,
            asset_id,
            vault,
            amount: 0,
            distribution_rate: BASE_RATE,
            epoch: 0,
            scale: 0,
            entry_count: 0,
            total_staked: 0,
            total_distributed: 0,
            total_burned: 0,
            total_withdrawn: 0,
            initialized_at,
        }
    }

    /// Returns true if nothing is attributable to entries
    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Net value that should sit in the vault according to the counters
    pub fn expected_vault_balance(&self) -> Option<u64> {
        self.total_staked
            .checked_add(self.total_distributed)?
            .checked_sub(self.total_burned)?
            .checked_sub(self.total_withdrawn)
    }

    /// Serialize to stored bytes
    pub fn to_bytes(&self) -> StakingResult<Vec<u8>> {
        encode_record(RecordKind::PoolState, self)
    }

    /// Deserialize from stored bytes
    pub fn from_bytes(bytes: &[u8]) -> StakingResult<Self> {
        decode_record(RecordKind::PoolState, bytes)
    }
}

// ============ Entry Types ============

/// One depositor's claim against one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakeEntry {
    /// Depositor
    pub owner: Address,
    /// Pool asset this entry belongs to
    pub asset_id: AssetId,
    /// Principal at the last stake (base units)
    pub balance: u64,
    /// Pool index at the last stake
    pub initial_distribution_rate: u128,
    /// Pool epoch at the last stake
    pub snapshot_epoch: u64,
    /// Pool scale at the last stake
    pub snapshot_scale: u64,
    /// Host logical time of the last stake
    pub last_staked: u64,
}

impl StakeEntry {
    /// Creates an empty entry snapshotting the pool's current index
    pub fn new(owner: Address, pool: &PoolState) -> Self {
        Self {
            owner,
            asset_id: pool.asset_id,
            balance: 0,
            initial_distribution_rate: pool.distribution_rate,
            snapshot_epoch: pool.epoch,
            snapshot_scale: pool.scale,
            last_staked: 0,
        }
    }

    /// Returns true if the entry holds principal
    pub fn is_active(&self) -> bool {
        self.balance > 0
    }

    /// Serialize to stored bytes
    pub fn to_bytes(&self) -> StakingResult<Vec<u8>> {
        encode_record(RecordKind::StakeEntry, self)
    }

    /// Deserialize from stored bytes
    pub fn from_bytes(bytes: &[u8]) -> StakingResult<Self> {
        decode_record(RecordKind::StakeEntry, bytes)
    }
}
