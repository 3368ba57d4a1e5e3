//! Staking Events
//!
//! Events are emitted by every committed transition and can be indexed
//! by whatever host drives the ledger.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, AssetId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Lifecycle Events (0x01 - 0x1F)
    PoolInitialized = 0x01,
    EntryInitialized = 0x02,

    // Depositor Events (0x20 - 0x3F)
    Staked = 0x20,
    Unstaked = 0x21,

    // Authority Events (0x40 - 0x5F)
    Distributed = 0x40,
    Burned = 0x41,
    EpochAdvanced = 0x42,
    IndexRescaled = 0x43,
}

/// Main event enum containing all staking events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StakingEvent {
    // ============ Lifecycle Events ============

    /// Emitted when a pool is created for an asset
    PoolInitialized {
        asset_id: AssetId,
        authority: Address,
        distribution_rate: u128,
    },

    /// Emitted when a depositor opens an entry
    EntryInitialized {
        asset_id: AssetId,
        owner: Address,
        initial_distribution_rate: u128,
    },

    // ============ Depositor Events ============

    /// Emitted when value moves into the pool
    Staked {
        asset_id: AssetId,
        owner: Address,
        amount: u64,
        new_balance: u64,
        pool_amount: u64,
    },

    /// Emitted when an entry is paid out and reset
    Unstaked {
        asset_id: AssetId,
        owner: Address,
        principal: u64,
        payout: u64,
        pool_amount: u64,
    },

    // ============ Authority Events ============

    /// Emitted when yield is injected
    Distributed {
        asset_id: AssetId,
        amount: u64,
        growth_factor: u128,
        distribution_rate: u128,
        pool_amount: u64,
    },

    /// Emitted when value is removed
    Burned {
        asset_id: AssetId,
        amount: u64,
        distribution_rate: u128,
        pool_amount: u64,
    },

    /// Emitted when a burn empties the index and entries from older epochs lapse
    EpochAdvanced {
        asset_id: AssetId,
        new_epoch: u64,
    },

    /// Emitted when a burn leaves the index so small it is multiplied back up
    IndexRescaled {
        asset_id: AssetId,
        new_scale: u64,
    },
}

impl StakingEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::PoolInitialized { .. } => EventType::PoolInitialized,
            Self::EntryInitialized { .. } => EventType::EntryInitialized,
            Self::Staked { .. } => EventType::Staked,
            Self::Unstaked { .. } => EventType::Unstaked,
            Self::Distributed { .. } => EventType::Distributed,
            Self::Burned { .. } => EventType::Burned,
            Self::EpochAdvanced { .. } => EventType::EpochAdvanced,
            Self::IndexRescaled { .. } => EventType::IndexRescaled,
        }
    }

    /// Get the pool asset the event belongs to
    pub fn asset_id(&self) -> AssetId {
        match self {
            Self::PoolInitialized { asset_id, .. } => *asset_id,
            Self::EntryInitialized { asset_id, .. } => *asset_id,
            Self::Staked { asset_id, .. } => *asset_id,
            Self::Unstaked { asset_id, .. } => *asset_id,
            Self::Distributed { asset_id, .. } => *asset_id,
            Self::Burned { asset_id, .. } => *asset_id,
            Self::EpochAdvanced { asset_id, .. } => *asset_id,
            Self::IndexRescaled { asset_id, .. } => *asset_id,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<StakingEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: StakingEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[StakingEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<StakingEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&StakingEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
