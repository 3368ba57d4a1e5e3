//! RND Staking Pool
//!
//! Pooled reward-distribution ledger. Depositors stake a fungible asset into
//! a shared vault; the pool authority periodically distributes yield into it
//! or burns value out of it, and every depositor's claim moves in proportion
//! without the pool ever walking its list of depositors.
//!
//! ## Operations
//!
//! | operation    | caller     | effect                                          |
//! |--------------|------------|-------------------------------------------------|
//! | `init_pool`  | authority  | empty pool at the base rate                     |
//! | `init_entry` | depositor  | entry snapshotting the current rate (idempotent)|
//! | `stake`      | depositor  | funds into the vault, snapshot refreshed        |
//! | `unstake`    | depositor  | full payout at the current rate, balance zeroed |
//! | `distribute` | authority  | mint into the vault, rate grows                 |
//! | `burn`       | authority  | burn from the vault, rate per burn policy       |
//!
//! [`engine`] holds the transitions as functions over records and a
//! [`CustodyAdapter`](rnd_staking_common::CustodyAdapter); [`StakingLedger`]
//! is an in-memory host that stores the records and sequences calls;
//! [`StakingInstruction`] is the CBOR wire form of the six operations.

pub mod engine;
pub mod instruction;
pub mod ledger;

#[cfg(test)]
mod integration_tests;

pub use engine::{
    current_value, execute_burn, execute_distribute, execute_init_entry, execute_init_pool,
    execute_stake, execute_unstake, pending_reward, BurnRequest, BurnResult, DistributeRequest,
    DistributeResult, InitEntryRequest, InitEntryResult, InitPoolRequest, InitPoolResult,
    StakeRequest, StakeResult, UnstakeRequest, UnstakeResult,
};
pub use instruction::StakingInstruction;
pub use ledger::StakingLedger;
