//! In-memory ledger.
//!
//! A reference host for the engine: it stores records by derived address,
//! sequences operations through `&mut self`, stamps them with a logical
//! clock and commits a transition only after the engine and custody both
//! succeeded.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use rnd_staking_common::{
    addressing::{entry_address, pool_address},
    config::LedgerConfig,
    custody::CustodyAdapter,
    errors::{StakingError, StakingResult},
    events::{EventLog, StakingEvent},
    types::{Address, AssetId, PoolState, StakeEntry, VaultRef},
};

use crate::engine::{
    self, BurnRequest, BurnResult, DistributeRequest, DistributeResult, InitEntryRequest,
    InitPoolRequest, StakeRequest, StakeResult, UnstakeRequest, UnstakeResult,
};
use crate::instruction::StakingInstruction;

/// Pool ledger over a custody adapter.
pub struct StakingLedger<C: CustodyAdapter> {
    config: LedgerConfig,
    program_authority: Option<Address>,
    custody: C,
    records: BTreeMap<Address, Vec<u8>>,
    events: EventLog,
    clock: u64,
}

impl<C: CustodyAdapter> StakingLedger<C> {
    /// Build a ledger; the configuration is validated up front.
    pub fn new(config: LedgerConfig, custody: C) -> StakingResult<Self> {
        config.validate()?;
        let program_authority = config.program_authority()?;
        Ok(Self {
            config,
            program_authority,
            custody,
            records: BTreeMap::new(),
            events: EventLog::new(),
            clock: 0,
        })
    }

    // ============ Operations ============

    /// Create the pool for `asset_id` with `caller` as its authority.
    pub fn init_pool(
        &mut self,
        caller: &Address,
        asset_id: &AssetId,
        vault: &VaultRef,
    ) -> StakingResult<PoolState> {
        self.apply_init_pool(caller, asset_id, vault)
            .inspect_err(|e| rejected("init_pool", caller, e))
    }

    /// Open `caller`'s entry; returns the existing entry if already open.
    pub fn init_entry(&mut self, caller: &Address, asset_id: &AssetId) -> StakingResult<StakeEntry> {
        self.apply_init_entry(caller, asset_id)
            .inspect_err(|e| rejected("init_entry", caller, e))
    }

    /// Stake `amount` from `caller` into their entry.
    pub fn stake(&mut self, caller: &Address, asset_id: &AssetId, amount: u64) -> StakingResult<StakeResult> {
        self.apply_stake(caller, asset_id, amount)
            .inspect_err(|e| rejected("stake", caller, e))
    }

    /// Pay out `caller`'s entry in full.
    pub fn unstake(&mut self, caller: &Address, asset_id: &AssetId) -> StakingResult<UnstakeResult> {
        self.apply_unstake(caller, asset_id)
            .inspect_err(|e| rejected("unstake", caller, e))
    }

    /// Inject `amount` of yield into the pool.
    pub fn distribute(
        &mut self,
        caller: &Address,
        asset_id: &AssetId,
        amount: u64,
    ) -> StakingResult<DistributeResult> {
        self.apply_distribute(caller, asset_id, amount)
            .inspect_err(|e| rejected("distribute", caller, e))
    }

    /// Burn `amount` from the pool under the configured policy.
    pub fn burn(&mut self, caller: &Address, asset_id: &AssetId, amount: u64) -> StakingResult<BurnResult> {
        self.apply_burn(caller, asset_id, amount)
            .inspect_err(|e| rejected("burn", caller, e))
    }

    /// Decode a CBOR instruction and run it on behalf of `caller`.
    pub fn process(&mut self, caller: &Address, bytes: &[u8]) -> StakingResult<()> {
        let instruction =
            StakingInstruction::decode(bytes).inspect_err(|e| rejected("process", caller, e))?;
        debug!(op = instruction.name(), "processing instruction");

        match instruction {
            StakingInstruction::InitPool { asset_id, vault } => {
                self.init_pool(caller, &asset_id, &vault)?;
            }
            StakingInstruction::InitEntry { asset_id } => {
                self.init_entry(caller, &asset_id)?;
            }
            StakingInstruction::Stake { asset_id, amount } => {
                self.stake(caller, &asset_id, amount)?;
            }
            StakingInstruction::Unstake { asset_id } => {
                self.unstake(caller, &asset_id)?;
            }
            StakingInstruction::Distribute { asset_id, amount } => {
                self.distribute(caller, &asset_id, amount)?;
            }
            StakingInstruction::Burn { asset_id, amount } => {
                self.burn(caller, &asset_id, amount)?;
            }
        }
        Ok(())
    }

    // ============ Transitions ============

    fn apply_init_pool(
        &mut self,
        caller: &Address,
        asset_id: &AssetId,
        vault: &VaultRef,
    ) -> StakingResult<PoolState> {
        let request = InitPoolRequest {
            authority: *caller,
            asset_id: *asset_id,
            vault: *vault,
            timestamp: self.clock,
        };
        let existing = self.find_pool(asset_id)?;
        let result = engine::execute_init_pool(&request, existing.as_ref(), self.program_authority.as_ref())?;

        self.store_pool(&result.pool)?;
        self.commit(result.events);
        Ok(result.pool)
    }

    fn apply_init_entry(&mut self, caller: &Address, asset_id: &AssetId) -> StakingResult<StakeEntry> {
        let pool = self.load_pool(asset_id)?;
        let existing = self.find_entry(caller, asset_id)?;
        let request = InitEntryRequest { depositor: *caller };
        let result = engine::execute_init_entry(&request, &pool, existing.as_ref())?;

        if !result.created {
            debug!(owner = %engine::hex_id(caller), "entry already open");
            return Ok(result.entry);
        }
        self.store_pool(&result.pool)?;
        self.store_entry(&result.entry)?;
        self.commit(result.events);
        Ok(result.entry)
    }

    fn apply_stake(&mut self, caller: &Address, asset_id: &AssetId, amount: u64) -> StakingResult<StakeResult> {
        let pool = self.load_pool(asset_id)?;
        let entry = self.load_entry(caller, asset_id)?;
        let request = StakeRequest {
            depositor: *caller,
            amount,
            timestamp: self.clock,
        };
        let result = engine::execute_stake(&request, &pool, &entry, &self.config, &mut self.custody)?;

        self.store_pool(&result.pool)?;
        self.store_entry(&result.entry)?;
        self.commit(result.events.clone());
        Ok(result)
    }

    fn apply_unstake(&mut self, caller: &Address, asset_id: &AssetId) -> StakingResult<UnstakeResult> {
        let pool = self.load_pool(asset_id)?;
        let entry = self.load_entry(caller, asset_id)?;
        let request = UnstakeRequest { depositor: *caller };
        let result = engine::execute_unstake(&request, &pool, &entry, &mut self.custody)?;

        self.store_pool(&result.pool)?;
        self.store_entry(&result.entry)?;
        self.commit(result.events.clone());
        Ok(result)
    }

    fn apply_distribute(
        &mut self,
        caller: &Address,
        asset_id: &AssetId,
        amount: u64,
    ) -> StakingResult<DistributeResult> {
        let pool = self.load_pool(asset_id)?;
        let request = DistributeRequest {
            authority: *caller,
            amount,
        };
        let result = engine::execute_distribute(&request, &pool, &mut self.custody)?;

        self.store_pool(&result.pool)?;
        self.commit(result.events.clone());
        Ok(result)
    }

    fn apply_burn(&mut self, caller: &Address, asset_id: &AssetId, amount: u64) -> StakingResult<BurnResult> {
        let pool = self.load_pool(asset_id)?;
        let request = BurnRequest {
            authority: *caller,
            amount,
        };
        let result = engine::execute_burn(&request, &pool, self.config.burn_policy, &mut self.custody)?;

        self.store_pool(&result.pool)?;
        self.commit(result.events.clone());
        Ok(result)
    }

    // ============ Queries ============

    /// Pool state for an asset.
    pub fn pool(&self, asset_id: &AssetId) -> StakingResult<PoolState> {
        self.load_pool(asset_id)
    }

    /// A depositor's entry in an asset pool.
    pub fn entry(&self, depositor: &Address, asset_id: &AssetId) -> StakingResult<StakeEntry> {
        self.load_entry(depositor, asset_id)
    }

    /// What the depositor would receive by unstaking now.
    pub fn current_value(&self, depositor: &Address, asset_id: &AssetId) -> StakingResult<u64> {
        let pool = self.load_pool(asset_id)?;
        let entry = self.load_entry(depositor, asset_id)?;
        engine::current_value(&entry, &pool)
    }

    /// Accrued reward above the depositor's principal.
    pub fn pending_reward(&self, depositor: &Address, asset_id: &AssetId) -> StakingResult<u64> {
        let pool = self.load_pool(asset_id)?;
        let entry = self.load_entry(depositor, asset_id)?;
        engine::pending_reward(&entry, &pool)
    }

    /// Events committed so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drain committed events.
    pub fn take_events(&mut self) -> Vec<StakingEvent> {
        std::mem::take(&mut self.events).into_events()
    }

    /// Custody backing the vaults.
    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Mutable custody, for funding depositors and freezing accounts.
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    /// Configuration the ledger was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Current logical time.
    pub fn now(&self) -> u64 {
        self.clock
    }

    /// Advance logical time by `ticks`.
    pub fn advance_clock(&mut self, ticks: u64) {
        self.clock = self.clock.saturating_add(ticks);
    }

    // ============ Storage ============

    fn load_pool(&self, asset_id: &AssetId) -> StakingResult<PoolState> {
        let bytes = self
            .records
            .get(&pool_address(asset_id))
            .ok_or(StakingError::PoolNotFound)?;
        PoolState::from_bytes(bytes)
    }

    fn load_entry(&self, depositor: &Address, asset_id: &AssetId) -> StakingResult<StakeEntry> {
        let bytes = self
            .records
            .get(&entry_address(depositor, asset_id))
            .ok_or(StakingError::EntryNotFound)?;
        StakeEntry::from_bytes(bytes)
    }

    fn find_pool(&self, asset_id: &AssetId) -> StakingResult<Option<PoolState>> {
        match self.load_pool(asset_id) {
            Ok(pool) => Ok(Some(pool)),
            Err(StakingError::PoolNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn find_entry(&self, depositor: &Address, asset_id: &AssetId) -> StakingResult<Option<StakeEntry>> {
        match self.load_entry(depositor, asset_id) {
            Ok(entry) => Ok(Some(entry)),
            Err(StakingError::EntryNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store_pool(&mut self, pool: &PoolState) -> StakingResult<()> {
        self.records.insert(pool_address(&pool.asset_id), pool.to_bytes()?);
        Ok(())
    }

    fn store_entry(&mut self, entry: &StakeEntry) -> StakingResult<()> {
        self.records
            .insert(entry_address(&entry.owner, &entry.asset_id), entry.to_bytes()?);
        Ok(())
    }

    fn commit(&mut self, events: Vec<StakingEvent>) {
        for event in events {
            self.events.emit(event);
        }
    }
}

fn rejected(op: &str, caller: &Address, error: &StakingError) {
    warn!(
        op,
        caller = %engine::hex_id(caller),
        code = error.code(),
        %error,
        "operation rejected"
    );
}
