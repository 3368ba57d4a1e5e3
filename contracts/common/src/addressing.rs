//! Record Addressing
//!
//! Deterministic derivation of the keys under which pool and entry records
//! are stored. Seeds follow the on-chain layout:
//!
//! | record          | seeds                                        |
//! |-----------------|----------------------------------------------|
//! | pool state      | `asset_id, "state"`                          |
//! | stake entry     | `depositor, asset_id, "stake_entry"`         |
//! | vault           | `asset_id, vault_authority, "vault"`         |
//! | vault authority | `"vault_authority"`                          |
//!
//! Every seed is length-prefixed before hashing, so distinct seed lists can
//! never produce the same preimage.

use sha2::{Digest, Sha256};

use crate::constants::seeds;
use crate::types::{Address, AssetId, VaultRef};

/// Domain tag mixed into every derivation
pub const ADDRESS_DOMAIN: &[u8] = b"rnd-staking/v1";

/// Hash a list of seeds into a 32-byte address
pub fn derive_address(seed_list: &[&[u8]]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(ADDRESS_DOMAIN);
    for seed in seed_list {
        hasher.update((seed.len() as u32).to_le_bytes());
        hasher.update(seed);
    }
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

/// Address of the pool state for an asset
pub fn pool_address(asset_id: &AssetId) -> Address {
    derive_address(&[asset_id, seeds::STAKE_POOL_STATE])
}

/// Address of a depositor's entry in an asset pool
pub fn entry_address(depositor: &Address, asset_id: &AssetId) -> Address {
    derive_address(&[depositor, asset_id, seeds::STAKE_ENTRY])
}

/// Signer that owns every vault
pub fn vault_authority() -> Address {
    derive_address(&[seeds::VAULT_AUTHORITY])
}

/// Vault holding an asset pool's tokens
pub fn vault_address(asset_id: &AssetId) -> VaultRef {
    derive_address(&[asset_id, &vault_authority(), seeds::VAULT])
}
