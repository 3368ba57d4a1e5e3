//! RND Staking Common Library
//!
//! Shared types, constants, and utilities for the RND staking pool.
//!
//! A pool accepts one fungible asset from many depositors and tracks a single
//! compounding index, the distribution rate. Yield injected into the pool
//! raises the index; every entry's value is its principal scaled by how far
//! the index moved since the entry last staked. No operation ever iterates
//! over depositors.
//!
//! ## Key Features
//!
//! - **Two Records**: [`PoolState`] per asset, [`StakeEntry`] per depositor per asset
//! - **Fixed-Point Index**: `u128` rate on a 1e11 scale, checked arithmetic throughout
//! - **Custody Boundary**: [`CustodyAdapter`] is the only way value moves
//! - **Deterministic Addressing**: SHA-256 over the on-chain seed layout
//! - **Typed Errors**: stable `E0xx` codes for logs and front ends
//! - **Events**: every committed transition is recorded in an [`EventLog`]
//! - **Configuration**: minimum stake, burn policy and program authority from TOML

pub mod access_control;
pub mod addressing;
pub mod config;
pub mod constants;
pub mod custody;
pub mod errors;
pub mod events;
pub mod math;
pub mod types;


// Re-exports for convenience
pub use access_control::*;
pub use addressing::*;
pub use config::{BurnPolicy, LedgerConfig};
pub use constants::*;
pub use custody::*;
pub use errors::*;
pub use events::*;
pub use math::*;
pub use types::*;
