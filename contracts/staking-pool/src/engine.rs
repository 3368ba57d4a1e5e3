//! Accounting Engine
//!
//! One function per transition. Each takes the records as they are, checks
//! every precondition, computes the successor records on copies, performs the
//! single custody call and only then returns the new records for the host to
//! commit. A returned error means neither the records nor custody changed.
//!
//! ## Key Features
//!
//! - **O(1) Transitions**: no operation looks at any entry other than the caller's
//! - **Compounding Index**: distributions multiply the pool's distribution rate
//! - **Ratio Payouts**: an entry is worth `balance * rate_now / rate_at_stake`
//! - **Burn Policies**: losses either shrink the index or stay with the pool amount
//! - **Epochs**: a burn that wipes the index out starts a fresh epoch
//! - **Scales**: a burn that leaves the index tiny multiplies it back up

use tracing::{debug, info};

use rnd_staking_common::{
    access_control::{require_authority, require_owner, require_program_authority},
    config::{BurnPolicy, LedgerConfig},
    constants::precision::BASE_RATE,
    custody::CustodyAdapter,
    errors::{StakingError, StakingResult},
    events::StakingEvent,
    math::{
        compound_rate, growth_factor, pool_sub, rescaled_divisor, safe_add, scaled_value, shrink_rate,
    },
    types::{Address, AssetId, PoolState, StakeEntry, VaultRef},
};

// ============================================================================
// Requests
// ============================================================================

/// Request to create the pool for an asset
#[derive(Debug, Clone)]
pub struct InitPoolRequest {
    /// Caller, becomes the pool authority
    pub authority: Address,
    /// Asset the pool accepts
    pub asset_id: AssetId,
    /// Custody vault for the asset
    pub vault: VaultRef,
    /// Host logical time
    pub timestamp: u64,
}

/// Request to open a depositor's entry
#[derive(Debug, Clone)]
pub struct InitEntryRequest {
    /// Depositor opening the entry
    pub depositor: Address,
}

/// Request to stake into an entry
#[derive(Debug, Clone)]
pub struct StakeRequest {
    /// Depositor (must own the entry)
    pub depositor: Address,
    /// Amount moved from the depositor's external account
    pub amount: u64,
    /// Host logical time
    pub timestamp: u64,
}

/// Request to pay out an entry in full
#[derive(Debug, Clone)]
pub struct UnstakeRequest {
    /// Depositor (must own the entry)
    pub depositor: Address,
}

/// Request to inject yield
#[derive(Debug, Clone)]
pub struct DistributeRequest {
    /// Caller (must be the pool authority)
    pub authority: Address,
    /// Amount minted into the vault
    pub amount: u64,
}

/// Request to remove value
#[derive(Debug, Clone)]
pub struct BurnRequest {
    /// Caller (must be the pool authority)
    pub authority: Address,
    /// Amount burned from the vault
    pub amount: u64,
}

// ============================================================================
// Results
// ============================================================================

/// Result of pool creation
#[derive(Debug, Clone)]
pub struct InitPoolResult {
    /// The new pool
    pub pool: PoolState,
    /// Events to emit on commit
    pub events: Vec<StakingEvent>,
}

/// Result of entry initialization
#[derive(Debug, Clone)]
pub struct InitEntryResult {
    /// Pool (entry count bumped on creation)
    pub pool: PoolState,
    /// The entry, new or existing
    pub entry: StakeEntry,
    /// False when the entry already existed and nothing changed
    pub created: bool,
    /// Events to emit on commit
    pub events: Vec<StakingEvent>,
}

/// Result of a stake
#[derive(Debug, Clone)]
pub struct StakeResult {
    /// Updated pool
    pub pool: PoolState,
    /// Updated entry
    pub entry: StakeEntry,
    /// Value the entry held before this stake, now part of its balance
    pub rolled_value: u64,
    /// Events to emit on commit
    pub events: Vec<StakingEvent>,
}

/// Result of an unstake
#[derive(Debug, Clone)]
pub struct UnstakeResult {
    /// Updated pool
    pub pool: PoolState,
    /// Entry reset to zero balance
    pub entry: StakeEntry,
    /// Balance before the unstake
    pub principal: u64,
    /// Amount transferred out of the vault
    pub payout: u64,
    /// Events to emit on commit
    pub events: Vec<StakingEvent>,
}

/// Result of a distribution
#[derive(Debug, Clone)]
pub struct DistributeResult {
    /// Updated pool
    pub pool: PoolState,
    /// Factor applied to the rate (scaled by RATE_SCALE)
    pub growth_factor: u128,
    /// Events to emit on commit
    pub events: Vec<StakingEvent>,
}

/// Result of a burn
#[derive(Debug, Clone)]
pub struct BurnResult {
    /// Updated pool
    pub pool: PoolState,
    /// True when the burn emptied the index and a new epoch started
    pub epoch_advanced: bool,
    /// Times the index was multiplied back up by this burn
    pub rescales: u64,
    /// Events to emit on commit
    pub events: Vec<StakingEvent>,
}

// ============================================================================
// Queries
// ============================================================================

/// Value an entry would pay out right now
///
/// Zero for an empty entry and for an entry snapshotted in an epoch the pool
/// has since left. An entry snapshotted before the index was rescaled has its
/// snapshot lifted to the current scale first; one too many scales behind for
/// that to fit is worth nothing.
pub fn current_value(entry: &StakeEntry, pool: &PoolState) -> StakingResult<u64> {
    if entry.snapshot_epoch < pool.epoch {
        return Ok(0);
    }
    let scale_gap = pool.scale.saturating_sub(entry.snapshot_scale);
    match rescaled_divisor(entry.initial_distribution_rate, scale_gap) {
        Some(divisor) => scaled_value(entry.balance, pool.distribution_rate, divisor),
        None => Ok(0),
    }
}

/// Accrued reward on top of principal (zero when the entry is under water)
pub fn pending_reward(entry: &StakeEntry, pool: &PoolState) -> StakingResult<u64> {
    Ok(current_value(entry, pool)?.saturating_sub(entry.balance))
}

fn require_same_asset(entry: &StakeEntry, pool: &PoolState) -> StakingResult<()> {
    if entry.asset_id != pool.asset_id {
        return Err(StakingError::AssetMismatch);
    }
    Ok(())
}

// ============================================================================
// Transitions
// ============================================================================

/// Create the pool for an asset
pub fn execute_init_pool(
    request: &InitPoolRequest,
    existing: Option<&PoolState>,
    program_authority: Option<&Address>,
) -> StakingResult<InitPoolResult> {
    // 1. Only the pinned program authority may create pools
    require_program_authority(program_authority, &request.authority)?;

    // 2. One pool per asset
    if existing.is_some() {
        return Err(StakingError::AlreadyInitialized);
    }

    // 3. Empty pool at the base rate
    let pool = PoolState::new(
        request.authority,
        request.asset_id,
        request.vault,
        request.timestamp,
    );

    info!(
        asset = %hex_id(&pool.asset_id),
        rate = pool.distribution_rate,
        "pool initialized"
    );

    let events = vec![StakingEvent::PoolInitialized {
        asset_id: pool.asset_id,
        authority: pool.authority,
        distribution_rate: pool.distribution_rate,
    }];

    Ok(InitPoolResult { pool, events })
}

/// Open a depositor's entry; a second call is a no-op
pub fn execute_init_entry(
    request: &InitEntryRequest,
    pool: &PoolState,
    existing: Option<&StakeEntry>,
) -> StakingResult<InitEntryResult> {
    // 1. Existing entry: nothing to do
    if let Some(entry) = existing {
        require_owner(entry, &request.depositor)?;
        require_same_asset(entry, pool)?;
        return Ok(InitEntryResult {
            pool: pool.clone(),
            entry: entry.clone(),
            created: false,
            events: Vec::new(),
        });
    }

    // 2. Snapshot the pool's current index
    let entry = StakeEntry::new(request.depositor, pool);

    // 3. Count the entry
    let mut new_pool = pool.clone();
    new_pool.entry_count = safe_add(pool.entry_count, 1)?;

    debug!(
        owner = %hex_id(&entry.owner),
        rate = entry.initial_distribution_rate,
        "entry initialized"
    );

    let events = vec![StakingEvent::EntryInitialized {
        asset_id: entry.asset_id,
        owner: entry.owner,
        initial_distribution_rate: entry.initial_distribution_rate,
    }];

    Ok(InitEntryResult {
        pool: new_pool,
        entry,
        created: true,
        events,
    })
}

/// Move value from the depositor into the pool
///
/// Value already accrued by the entry is rolled into the new balance and the
/// snapshot moves to the current index, so nothing is lost or double counted.
pub fn execute_stake<C: CustodyAdapter>(
    request: &StakeRequest,
    pool: &PoolState,
    entry: &StakeEntry,
    config: &LedgerConfig,
    custody: &mut C,
) -> StakingResult<StakeResult> {
    // 1. Amount must be positive
    if request.amount == 0 {
        return Err(StakingError::ZeroAmount);
    }

    // 2. Check minimum stake
    if request.amount < config.min_stake {
        return Err(StakingError::BelowMinimum {
            amount: request.amount,
            minimum: config.min_stake,
        });
    }

    // 3. Entry must belong to the caller and to this pool
    require_owner(entry, &request.depositor)?;
    require_same_asset(entry, pool)?;

    // 4. Compute successor records
    let rolled_value = current_value(entry, pool)?;
    let new_balance = safe_add(rolled_value, request.amount)?;
    let new_amount = safe_add(pool.amount, request.amount)?;
    let new_total_staked = safe_add(pool.total_staked, request.amount)?;

    // 5. Pull funds into the vault
    custody.transfer_in(&pool.vault, &request.depositor, request.amount)?;

    let mut new_pool = pool.clone();
    new_pool.amount = new_amount;
    new_pool.total_staked = new_total_staked;

    let mut new_entry = entry.clone();
    new_entry.balance = new_balance;
    new_entry.initial_distribution_rate = pool.distribution_rate;
    new_entry.snapshot_epoch = pool.epoch;
    new_entry.snapshot_scale = pool.scale;
    new_entry.last_staked = request.timestamp;

    info!(
        owner = %hex_id(&request.depositor),
        amount = request.amount,
        balance = new_balance,
        pool_amount = new_amount,
        "stake committed"
    );

    let events = vec![StakingEvent::Staked {
        asset_id: pool.asset_id,
        owner: request.depositor,
        amount: request.amount,
        new_balance,
        pool_amount: new_amount,
    }];

    Ok(StakeResult {
        pool: new_pool,
        entry: new_entry,
        rolled_value,
        events,
    })
}

/// Pay an entry out in full and zero it
pub fn execute_unstake<C: CustodyAdapter>(
    request: &UnstakeRequest,
    pool: &PoolState,
    entry: &StakeEntry,
    custody: &mut C,
) -> StakingResult<UnstakeResult> {
    // 1. Entry must belong to the caller and to this pool
    require_owner(entry, &request.depositor)?;
    require_same_asset(entry, pool)?;

    // 2. Something to withdraw
    if !entry.is_active() {
        return Err(StakingError::NothingStaked);
    }

    // 3. Payout at the current index, rounded once
    let payout = current_value(entry, pool)?;
    debug!(
        balance = entry.balance,
        rate_now = pool.distribution_rate,
        rate_initial = entry.initial_distribution_rate,
        payout,
        "unstake payout computed"
    );

    // 4. Pool must cover it
    let new_amount = pool_sub(pool.amount, payout)?;
    let new_total_withdrawn = safe_add(pool.total_withdrawn, payout)?;

    // 5. Release funds (a lapsed entry has nothing to move)
    if payout > 0 {
        custody.transfer_out(&pool.vault, &request.depositor, payout)?;
    }

    let mut new_pool = pool.clone();
    new_pool.amount = new_amount;
    new_pool.total_withdrawn = new_total_withdrawn;

    let mut new_entry = entry.clone();
    new_entry.balance = 0;

    info!(
        owner = %hex_id(&request.depositor),
        principal = entry.balance,
        payout,
        pool_amount = new_amount,
        "unstake committed"
    );

    let events = vec![StakingEvent::Unstaked {
        asset_id: pool.asset_id,
        owner: request.depositor,
        principal: entry.balance,
        payout,
        pool_amount: new_amount,
    }];

    Ok(UnstakeResult {
        pool: new_pool,
        entry: new_entry,
        principal: entry.balance,
        payout,
        events,
    })
}

/// Inject yield and grow the index proportionally
pub fn execute_distribute<C: CustodyAdapter>(
    request: &DistributeRequest,
    pool: &PoolState,
    custody: &mut C,
) -> StakingResult<DistributeResult> {
    // 1. Authority only
    require_authority(pool, &request.authority)?;

    // 2. Amount must be positive
    if request.amount == 0 {
        return Err(StakingError::ZeroAmount);
    }

    // 3. Someone has to receive it
    if pool.is_empty() {
        return Err(StakingError::EmptyPool);
    }

    // 4. rate *= 1 + amount / pool_amount
    let factor = growth_factor(request.amount, pool.amount)?;
    let new_rate = compound_rate(pool.distribution_rate, factor)?;
    if new_rate <= pool.distribution_rate {
        return Err(StakingError::DistributionTooSmall {
            amount: request.amount,
            pool_amount: pool.amount,
        });
    }
    let new_amount = safe_add(pool.amount, request.amount)?;
    let new_total_distributed = safe_add(pool.total_distributed, request.amount)?;
    debug!(
        amount = request.amount,
        growth_factor = factor,
        rate = new_rate,
        "distribution computed"
    );

    // 5. Mint into the vault
    custody.mint_into(&pool.vault, request.amount)?;

    let mut new_pool = pool.clone();
    new_pool.distribution_rate = new_rate;
    new_pool.amount = new_amount;
    new_pool.total_distributed = new_total_distributed;

    info!(
        asset = %hex_id(&pool.asset_id),
        amount = request.amount,
        rate = new_rate,
        pool_amount = new_amount,
        "distribution committed"
    );

    let events = vec![StakingEvent::Distributed {
        asset_id: pool.asset_id,
        amount: request.amount,
        growth_factor: factor,
        distribution_rate: new_rate,
        pool_amount: new_amount,
    }];

    Ok(DistributeResult {
        pool: new_pool,
        growth_factor: factor,
        events,
    })
}

/// Remove value from the pool
pub fn execute_burn<C: CustodyAdapter>(
    request: &BurnRequest,
    pool: &PoolState,
    policy: BurnPolicy,
    custody: &mut C,
) -> StakingResult<BurnResult> {
    // 1. Authority only
    require_authority(pool, &request.authority)?;

    // 2. Amount must be positive
    if request.amount == 0 {
        return Err(StakingError::ZeroAmount);
    }

    // 3. Pool must cover it
    let new_amount = pool_sub(pool.amount, request.amount)?;
    let new_total_burned = safe_add(pool.total_burned, request.amount)?;

    // 4. Apply the loss to the index
    let mut new_rate = pool.distribution_rate;
    let mut new_epoch = pool.epoch;
    let mut new_scale = pool.scale;
    let mut epoch_advanced = false;
    let mut rescales = 0;
    if policy == BurnPolicy::Socialized {
        let (shrunk, steps) = shrink_rate(pool.distribution_rate, request.amount, pool.amount)?;
        debug!(rate = shrunk, rescales = steps, "burn computed");

        if shrunk == 0 {
            // Index wiped out: every open entry is worth nothing
            new_rate = BASE_RATE;
            new_epoch = safe_add(pool.epoch, 1)?;
            new_scale = 0;
            epoch_advanced = true;
        } else {
            new_rate = shrunk;
            new_scale = safe_add(pool.scale, steps)?;
            rescales = steps;
        }
    }

    // 5. Burn from the vault
    custody.reduce_supply(&pool.vault, request.amount)?;

    let mut new_pool = pool.clone();
    new_pool.amount = new_amount;
    new_pool.total_burned = new_total_burned;
    new_pool.distribution_rate = new_rate;
    new_pool.epoch = new_epoch;
    new_pool.scale = new_scale;

    info!(
        asset = %hex_id(&pool.asset_id),
        amount = request.amount,
        ?policy,
        rate = new_rate,
        pool_amount = new_amount,
        "burn committed"
    );

    let mut events = vec![StakingEvent::Burned {
        asset_id: pool.asset_id,
        amount: request.amount,
        distribution_rate: new_rate,
        pool_amount: new_amount,
    }];
    if epoch_advanced {
        info!(epoch = new_epoch, "epoch advanced");
        events.push(StakingEvent::EpochAdvanced {
            asset_id: pool.asset_id,
            new_epoch,
        });
    }
    if rescales > 0 {
        info!(scale = new_scale, "index rescaled");
        events.push(StakingEvent::IndexRescaled {
            asset_id: pool.asset_id,
            new_scale,
        });
    }

    Ok(BurnResult {
        pool: new_pool,
        epoch_advanced,
        rescales,
        events,
    })
}

/// Short hex form of an identity for log fields
pub(crate) fn hex_id(id: &[u8; 32]) -> String {
    hex::encode(&id[..4])
}

// ============================================================================
// Tests
// ============================================================================
