//! Custody Module
//!
//! The boundary between the accounting engine and whatever actually holds
//! tokens. The engine only ever calls [`CustodyAdapter`]; each call either
//! fully succeeds or fully fails, and the engine commits nothing until it has
//! succeeded.
//!
//! [`InMemoryCustody`] is the reference adapter used by the in-memory ledger
//! and the test suites: holder balances, vault balances and supply counters.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{StakingError, StakingResult};
use crate::math::safe_add;
use crate::types::{Address, VaultRef};

// ============================================================================
// Adapter Interface
// ============================================================================

/// Token custody primitives consumed by the accounting engine
pub trait CustodyAdapter {
    /// Move `amount` from a depositor's external account into the vault
    fn transfer_in(&mut self, vault: &VaultRef, from: &Address, amount: u64) -> StakingResult<()>;

    /// Move `amount` out of the vault to a depositor's external account
    fn transfer_out(&mut self, vault: &VaultRef, to: &Address, amount: u64) -> StakingResult<()>;

    /// Mint `amount` of new supply directly into the vault
    fn mint_into(&mut self, vault: &VaultRef, amount: u64) -> StakingResult<()>;

    /// Burn `amount` of supply held by the vault
    fn reduce_supply(&mut self, vault: &VaultRef, amount: u64) -> StakingResult<()>;
}

// ============================================================================
// Types
// ============================================================================

/// Token supply state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSupply {
    /// Total supply in circulation
    pub total_supply: u64,
    /// Total minted (cumulative)
    pub total_minted: u64,
    /// Total burned (cumulative)
    pub total_burned: u64,
}

/// Reference custody over in-memory balances
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustody {
    holders: BTreeMap<Address, u64>,
    vaults: BTreeMap<VaultRef, u64>,
    supply: TokenSupply,
    frozen: BTreeSet<Address>,
}

impl InMemoryCustody {
    /// Create custody with no balances
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint tokens to a holder's external account (faucet / fixtures)
    pub fn credit(&mut self, holder: &Address, amount: u64) -> StakingResult<()> {
        let balance = self.balance_of(holder);
        let new_balance = safe_add(balance, amount)?;
        let new_supply = safe_add(self.supply.total_supply, amount)?;
        let new_minted = safe_add(self.supply.total_minted, amount)?;

        self.holders.insert(*holder, new_balance);
        self.supply.total_supply = new_supply;
        self.supply.total_minted = new_minted;
        Ok(())
    }

    /// External balance of a holder
    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.holders.get(holder).copied().unwrap_or(0)
    }

    /// Balance custodied by a vault
    pub fn vault_balance(&self, vault: &VaultRef) -> u64 {
        self.vaults.get(vault).copied().unwrap_or(0)
    }

    /// Supply counters
    pub fn supply(&self) -> &TokenSupply {
        &self.supply
    }

    /// Reject every transfer touching `account` until thawed
    pub fn freeze(&mut self, account: &Address) {
        self.frozen.insert(*account);
    }

    /// Lift a freeze
    pub fn thaw(&mut self, account: &Address) {
        self.frozen.remove(account);
    }

    fn ensure_not_frozen(&self, account: &Address) -> StakingResult<()> {
        if self.frozen.contains(account) {
            return Err(StakingError::TransferRejected { account: *account });
        }
        Ok(())
    }
}

impl CustodyAdapter for InMemoryCustody {
    fn transfer_in(&mut self, vault: &VaultRef, from: &Address, amount: u64) -> StakingResult<()> {
        self.ensure_not_frozen(from)?;
        self.ensure_not_frozen(vault)?;

        let available = self.balance_of(from);
        let new_from = available
            .checked_sub(amount)
            .ok_or(StakingError::InsufficientExternalBalance {
                available,
                requested: amount,
            })?;
        let new_vault = safe_add(self.vault_balance(vault), amount)?;

        self.holders.insert(*from, new_from);
        self.vaults.insert(*vault, new_vault);
        Ok(())
    }

    fn transfer_out(&mut self, vault: &VaultRef, to: &Address, amount: u64) -> StakingResult<()> {
        self.ensure_not_frozen(to)?;
        self.ensure_not_frozen(vault)?;

        let available = self.vault_balance(vault);
        let new_vault = available
            .checked_sub(amount)
            .ok_or(StakingError::InsufficientPoolBalance {
                available,
                required: amount,
            })?;
        let new_to = safe_add(self.balance_of(to), amount)?;

        self.vaults.insert(*vault, new_vault);
        self.holders.insert(*to, new_to);
        Ok(())
    }

    fn mint_into(&mut self, vault: &VaultRef, amount: u64) -> StakingResult<()> {
        self.ensure_not_frozen(vault)?;

        let new_vault = safe_add(self.vault_balance(vault), amount)?;
        let new_supply = safe_add(self.supply.total_supply, amount)?;
        let new_minted = safe_add(self.supply.total_minted, amount)?;

        self.vaults.insert(*vault, new_vault);
        self.supply.total_supply = new_supply;
        self.supply.total_minted = new_minted;
        Ok(())
    }

    fn reduce_supply(&mut self, vault: &VaultRef, amount: u64) -> StakingResult<()> {
        self.ensure_not_frozen(vault)?;

        let available = self.vault_balance(vault);
        let new_vault = available
            .checked_sub(amount)
            .ok_or(StakingError::InsufficientPoolBalance {
                available,
                required: amount,
            })?;

        self.vaults.insert(*vault, new_vault);
        self.supply.total_supply = self.supply.total_supply.saturating_sub(amount);
        self.supply.total_burned = self.supply.total_burned.saturating_add(amount);
        Ok(())
    }
}
