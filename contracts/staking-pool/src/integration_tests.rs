//! Integration Tests
//!
//! End-to-end runs through [`StakingLedger`] with in-memory custody.

#[cfg(test)]
mod tests {
    use crate::*;
    use rnd_staking_common::*;

    const ONE_RND: u64 = token::ONE;

    fn authority() -> Address {
        [1u8; 32]
    }

    fn alice() -> Address {
        [2u8; 32]
    }

    fn bob() -> Address {
        [3u8; 32]
    }

    fn carol() -> Address {
        [4u8; 32]
    }

    fn asset() -> AssetId {
        [50u8; 32]
    }

    fn create_test_ledger(config: LedgerConfig) -> StakingLedger<InMemoryCustody> {
        let mut custody = InMemoryCustody::new();
        for depositor in [alice(), bob(), carol()] {
            custody.credit(&depositor, 1_000 * ONE_RND).unwrap();
        }
        let mut ledger = StakingLedger::new(config, custody).unwrap();
        ledger
            .init_pool(&authority(), &asset(), &vault_address(&asset()))
            .unwrap();
        ledger
    }

    fn open_and_stake(ledger: &mut StakingLedger<InMemoryCustody>, who: Address, amount: u64) {
        ledger.init_entry(&who, &asset()).unwrap();
        ledger.stake(&who, &asset(), amount).unwrap();
    }

    fn assert_conserved(ledger: &StakingLedger<InMemoryCustody>) {
        let pool = ledger.pool(&asset()).unwrap();
        assert_eq!(pool.amount, ledger.custody().vault_balance(&pool.vault));
        assert_eq!(pool.expected_vault_balance(), Some(pool.amount));
    }

    // ============================================================================
    // Reference Scenario
    // ============================================================================

    #[test]
    fn test_reference_scenario() {
        let mut ledger = create_test_ledger(LedgerConfig::default());

        // 1. A stakes 200
        open_and_stake(&mut ledger, alice(), 200 * ONE_RND);
        let entry_a = ledger.entry(&alice(), &asset()).unwrap();
        assert_eq!(entry_a.balance, 200 * ONE_RND);
        assert_eq!(entry_a.initial_distribution_rate, precision::BASE_RATE);
        assert_eq!(ledger.pool(&asset()).unwrap().amount, 200 * ONE_RND);

        // 2. B stakes 400
        open_and_stake(&mut ledger, bob(), 400 * ONE_RND);
        assert_eq!(ledger.pool(&asset()).unwrap().amount, 600 * ONE_RND);

        // 3. Distribute 30 => +5%
        let distributed = ledger.distribute(&authority(), &asset(), 30 * ONE_RND).unwrap();
        assert_eq!(distributed.pool.amount, 630 * ONE_RND);
        assert_eq!(distributed.pool.distribution_rate, 105_000_000_000);

        // 4. C stakes 200 at the grown rate
        open_and_stake(&mut ledger, carol(), 200 * ONE_RND);
        let entry_c = ledger.entry(&carol(), &asset()).unwrap();
        assert_eq!(entry_c.initial_distribution_rate, 105_000_000_000);
        assert_eq!(ledger.pending_reward(&carol(), &asset()).unwrap(), 0);
        assert_eq!(ledger.pool(&asset()).unwrap().amount, 830 * ONE_RND);

        // 5. Burn 20, socialized
        let burned = ledger.burn(&authority(), &asset(), 20 * ONE_RND).unwrap();
        assert_eq!(burned.pool.amount, 810 * ONE_RND);
        assert_eq!(burned.pool.distribution_rate, 102_469_879_518);
        assert_conserved(&ledger);

        // 6. A unstakes
        let a = ledger.unstake(&alice(), &asset()).unwrap();
        assert_eq!(a.payout, 204_939_759);
        assert_eq!(a.pool.amount, 605_060_241);
        assert_eq!(ledger.entry(&alice(), &asset()).unwrap().balance, 0);
        assert_eq!(ledger.custody().balance_of(&alice()), 800 * ONE_RND + 204_939_759);

        // 7. B unstakes
        let b = ledger.unstake(&bob(), &asset()).unwrap();
        assert_eq!(b.payout, 409_879_518);
        assert_eq!(b.pool.amount, 195_180_723);

        // 8. C unstakes and empties the pool exactly
        let c = ledger.unstake(&carol(), &asset()).unwrap();
        assert_eq!(c.payout, 195_180_723);
        assert_eq!(c.pool.amount, 0);
        assert_eq!(ledger.custody().vault_balance(&vault_address(&asset())), 0);
        assert_conserved(&ledger);

        let supply = ledger.custody().supply();
        assert_eq!(supply.total_minted, 3_030 * ONE_RND);
        assert_eq!(supply.total_burned, 20 * ONE_RND);
        assert_eq!(supply.total_supply, 3_010 * ONE_RND);
    }

    // ============================================================================
    // Invariants
    // ============================================================================

    #[test]
    fn test_conservation_across_operations() {
        let mut ledger = create_test_ledger(LedgerConfig::default());

        open_and_stake(&mut ledger, alice(), 123 * ONE_RND);
        assert_conserved(&ledger);
        open_and_stake(&mut ledger, bob(), 7 * ONE_RND + 3);
        assert_conserved(&ledger);
        ledger.distribute(&authority(), &asset(), 11 * ONE_RND + 1).unwrap();
        assert_conserved(&ledger);
        ledger.burn(&authority(), &asset(), 3 * ONE_RND).unwrap();
        assert_conserved(&ledger);
        ledger.unstake(&bob(), &asset()).unwrap();
        assert_conserved(&ledger);
        ledger.stake(&alice(), &asset(), ONE_RND).unwrap();
        assert_conserved(&ledger);
        ledger.unstake(&alice(), &asset()).unwrap();
        assert_conserved(&ledger);
    }

    #[test]
    fn test_rate_monotonic_without_burns() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        let mut last_rate = ledger.pool(&asset()).unwrap().distribution_rate;

        open_and_stake(&mut ledger, alice(), 100 * ONE_RND);
        assert_eq!(ledger.pool(&asset()).unwrap().distribution_rate, last_rate);

        for round in 1..=5u64 {
            let result = ledger.distribute(&authority(), &asset(), round * ONE_RND).unwrap();
            assert!(result.pool.distribution_rate > last_rate);
            last_rate = result.pool.distribution_rate;

            open_and_stake(&mut ledger, bob(), ONE_RND);
            ledger.unstake(&bob(), &asset()).unwrap();
            assert_eq!(ledger.pool(&asset()).unwrap().distribution_rate, last_rate);
        }
    }

    #[test]
    fn test_zero_after_unstake_and_entry_reuse() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        open_and_stake(&mut ledger, alice(), 50 * ONE_RND);
        open_and_stake(&mut ledger, bob(), 50 * ONE_RND);

        for _ in 0..3 {
            ledger.distribute(&authority(), &asset(), 7 * ONE_RND).unwrap();
        }
        ledger.unstake(&alice(), &asset()).unwrap();
        assert_eq!(ledger.entry(&alice(), &asset()).unwrap().balance, 0);
        assert!(matches!(
            ledger.unstake(&alice(), &asset()),
            Err(StakingError::NothingStaked)
        ));

        // The entry persists and can be staked again at the current rate
        let entry_count = ledger.pool(&asset()).unwrap().entry_count;
        ledger.init_entry(&alice(), &asset()).unwrap();
        assert_eq!(ledger.pool(&asset()).unwrap().entry_count, entry_count);

        let result = ledger.stake(&alice(), &asset(), 10 * ONE_RND).unwrap();
        assert_eq!(result.rolled_value, 0);
        assert_eq!(result.entry.balance, 10 * ONE_RND);
        assert_eq!(
            result.entry.initial_distribution_rate,
            ledger.pool(&asset()).unwrap().distribution_rate
        );
    }

    #[test]
    fn test_idempotent_entry_init() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        let first = ledger.init_entry(&alice(), &asset()).unwrap();
        let events_before = ledger.events().len();

        let second = ledger.init_entry(&alice(), &asset()).unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.events().len(), events_before);
        assert_eq!(ledger.pool(&asset()).unwrap().entry_count, 1);
    }

    // ============================================================================
    // Failure Atomicity
    // ============================================================================

    #[test]
    fn test_insufficient_external_balance_commits_nothing() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        open_and_stake(&mut ledger, alice(), 100 * ONE_RND);
        let pool_before = ledger.pool(&asset()).unwrap();
        let entry_before = ledger.entry(&alice(), &asset()).unwrap();
        let events_before = ledger.events().len();

        let result = ledger.stake(&alice(), &asset(), 901 * ONE_RND);
        assert!(matches!(
            result,
            Err(StakingError::InsufficientExternalBalance { .. })
        ));
        assert!(result.unwrap_err().is_recoverable());

        assert_eq!(ledger.pool(&asset()).unwrap(), pool_before);
        assert_eq!(ledger.entry(&alice(), &asset()).unwrap(), entry_before);
        assert_eq!(ledger.events().len(), events_before);
        assert_conserved(&ledger);
    }

    #[test]
    fn test_custody_rejection_commits_nothing() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        open_and_stake(&mut ledger, alice(), 100 * ONE_RND);
        let pool_before = ledger.pool(&asset()).unwrap();

        let vault = vault_address(&asset());
        ledger.custody_mut().freeze(&vault);
        assert!(matches!(
            ledger.distribute(&authority(), &asset(), ONE_RND),
            Err(StakingError::TransferRejected { .. })
        ));
        assert!(matches!(
            ledger.unstake(&alice(), &asset()),
            Err(StakingError::TransferRejected { .. })
        ));
        assert_eq!(ledger.pool(&asset()).unwrap(), pool_before);
        assert_eq!(ledger.entry(&alice(), &asset()).unwrap().balance, 100 * ONE_RND);

        ledger.custody_mut().thaw(&vault);
        let result = ledger.unstake(&alice(), &asset()).unwrap();
        assert_eq!(result.payout, 100 * ONE_RND);
    }

    #[test]
    fn test_admin_operations_require_authority() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        open_and_stake(&mut ledger, alice(), 100 * ONE_RND);

        assert!(matches!(
            ledger.distribute(&alice(), &asset(), ONE_RND),
            Err(StakingError::Unauthorized { .. })
        ));
        assert!(matches!(
            ledger.burn(&bob(), &asset(), ONE_RND),
            Err(StakingError::Unauthorized { .. })
        ));
        assert_eq!(ledger.pool(&asset()).unwrap().amount, 100 * ONE_RND);
    }

    #[test]
    fn test_distribute_on_empty_pool() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        assert!(matches!(
            ledger.distribute(&authority(), &asset(), ONE_RND),
            Err(StakingError::EmptyPool)
        ));

        // Emptied again after a full unstake
        open_and_stake(&mut ledger, alice(), ONE_RND);
        ledger.unstake(&alice(), &asset()).unwrap();
        assert!(matches!(
            ledger.distribute(&authority(), &asset(), ONE_RND),
            Err(StakingError::EmptyPool)
        ));
    }

    // ============================================================================
    // Burn Policies
    // ============================================================================

    #[test]
    fn test_full_burn_starts_new_epoch() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        open_and_stake(&mut ledger, alice(), 100 * ONE_RND);

        let result = ledger.burn(&authority(), &asset(), 100 * ONE_RND).unwrap();
        assert!(result.epoch_advanced);
        assert_eq!(ledger.events().filter_by_type(EventType::EpochAdvanced).len(), 1);
        assert_eq!(ledger.current_value(&alice(), &asset()).unwrap(), 0);

        // The lapsed entry unstakes to nothing
        let lapsed = ledger.unstake(&alice(), &asset()).unwrap();
        assert_eq!(lapsed.payout, 0);
        assert_eq!(lapsed.entry.balance, 0);
        assert_eq!(ledger.custody().balance_of(&alice()), 900 * ONE_RND);

        // New depositors start fresh at the base rate
        open_and_stake(&mut ledger, bob(), 40 * ONE_RND);
        let entry = ledger.entry(&bob(), &asset()).unwrap();
        assert_eq!(entry.snapshot_epoch, 1);
        assert_eq!(entry.initial_distribution_rate, precision::BASE_RATE);

        ledger.distribute(&authority(), &asset(), 4 * ONE_RND).unwrap();
        assert_eq!(ledger.unstake(&bob(), &asset()).unwrap().payout, 44 * ONE_RND);
        assert_conserved(&ledger);
    }

    #[test]
    fn test_absorbed_burn_hits_last_withdrawer() {
        let config = LedgerConfig::default().with_burn_policy(BurnPolicy::Absorbed);
        let mut ledger = create_test_ledger(config);
        open_and_stake(&mut ledger, alice(), 100 * ONE_RND);
        open_and_stake(&mut ledger, bob(), 100 * ONE_RND);

        ledger.burn(&authority(), &asset(), 50 * ONE_RND).unwrap();
        assert_eq!(
            ledger.pool(&asset()).unwrap().distribution_rate,
            precision::BASE_RATE
        );

        // First out is paid in full
        assert_eq!(ledger.unstake(&alice(), &asset()).unwrap().payout, 100 * ONE_RND);

        // Second out finds the pool short
        let result = ledger.unstake(&bob(), &asset());
        assert!(matches!(
            result,
            Err(StakingError::InsufficientPoolBalance { available, required })
                if available == 50 * ONE_RND && required == 100 * ONE_RND
        ));
        assert_eq!(ledger.entry(&bob(), &asset()).unwrap().balance, 100 * ONE_RND);
        assert_conserved(&ledger);
    }

    #[test]
    fn test_near_total_burn_then_distribute() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        ledger
            .custody_mut()
            .credit(&alice(), 1_000_000 * ONE_RND)
            .unwrap();
        open_and_stake(&mut ledger, alice(), 1_000_000 * ONE_RND);

        // All but one base unit is burned
        let burned = ledger
            .burn(&authority(), &asset(), 1_000_000 * ONE_RND - 1)
            .unwrap();
        assert_eq!(burned.pool.amount, 1);
        assert_eq!(burned.pool.distribution_rate, precision::RESCALE_THRESHOLD);
        assert_eq!(burned.pool.scale, 3);
        assert_eq!(ledger.events().filter_by_type(EventType::IndexRescaled).len(), 1);
        assert_eq!(ledger.current_value(&alice(), &asset()).unwrap(), 1);

        // Bob joins and the yield still reaches him
        open_and_stake(&mut ledger, bob(), 100 * ONE_RND);
        let rate_before = ledger.pool(&asset()).unwrap().distribution_rate;
        let distributed = ledger.distribute(&authority(), &asset(), 10 * ONE_RND).unwrap();
        assert!(distributed.pool.distribution_rate > rate_before);
        assert_eq!(distributed.pool.distribution_rate, 109_999_999);
        assert_eq!(distributed.pool.amount, 110_000_001);

        let b = ledger.unstake(&bob(), &asset()).unwrap();
        assert_eq!(b.payout, 109_999_999);

        // Alice only ever had the one unit left
        let a = ledger.unstake(&alice(), &asset()).unwrap();
        assert_eq!(a.payout, 1);
        assert_eq!(a.pool.amount, 1);
        assert_conserved(&ledger);
    }

    // ============================================================================
    // Rounding
    // ============================================================================

    #[test]
    fn test_rounded_up_payout_can_leave_last_withdrawer_short() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        open_and_stake(&mut ledger, alice(), 1);
        open_and_stake(&mut ledger, bob(), 1);

        // 1.5 units owed to each, 3 units held
        let distributed = ledger.distribute(&authority(), &asset(), 1).unwrap();
        assert_eq!(distributed.pool.distribution_rate, 150_000_000_000);

        let a = ledger.unstake(&alice(), &asset()).unwrap();
        assert_eq!(a.payout, 2);
        assert_eq!(a.pool.amount, 1);

        let result = ledger.unstake(&bob(), &asset());
        assert!(matches!(
            result,
            Err(StakingError::InsufficientPoolBalance { available: 1, required: 2 })
        ));
        assert_eq!(ledger.entry(&bob(), &asset()).unwrap().balance, 1);
        assert_conserved(&ledger);
    }

    // ============================================================================
    // Instructions & Isolation
    // ============================================================================

    #[test]
    fn test_process_encoded_instructions() {
        let mut ledger = create_test_ledger(LedgerConfig::default());

        let steps = [
            (alice(), StakingInstruction::InitEntry { asset_id: asset() }),
            (alice(), StakingInstruction::Stake { asset_id: asset(), amount: 60 * ONE_RND }),
            (authority(), StakingInstruction::Distribute { asset_id: asset(), amount: 6 * ONE_RND }),
            (authority(), StakingInstruction::Burn { asset_id: asset(), amount: 6 * ONE_RND }),
            (alice(), StakingInstruction::Unstake { asset_id: asset() }),
        ];
        for (caller, instruction) in steps {
            let bytes = instruction.encode().unwrap();
            let result = ledger.process(&caller, &bytes);
            assert!(result.is_ok(), "{} failed: {:?}", instruction.name(), result);
        }

        let pool = ledger.pool(&asset()).unwrap();
        assert_eq!(pool.amount, 0);
        assert_eq!(pool.total_staked, 60 * ONE_RND);
        assert_eq!(pool.total_distributed, 6 * ONE_RND);
        assert_eq!(pool.total_burned, 6 * ONE_RND);
        assert_eq!(pool.total_withdrawn, 60 * ONE_RND);
        assert_eq!(ledger.custody().balance_of(&alice()), 1_000 * ONE_RND);
    }

    #[test]
    fn test_process_rejects_garbage() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        let pool_before = ledger.pool(&asset()).unwrap();

        let result = ledger.process(&alice(), b"not cbor at all");
        assert!(matches!(result, Err(StakingError::InvalidInstruction)));
        assert_eq!(ledger.pool(&asset()).unwrap(), pool_before);
    }

    #[test]
    fn test_pools_are_independent() {
        let mut ledger = create_test_ledger(LedgerConfig::default());
        let other: AssetId = [60u8; 32];
        ledger
            .init_pool(&authority(), &other, &vault_address(&other))
            .unwrap();

        open_and_stake(&mut ledger, alice(), 100 * ONE_RND);
        ledger.init_entry(&alice(), &other).unwrap();
        ledger.stake(&alice(), &other, 100 * ONE_RND).unwrap();

        ledger.distribute(&authority(), &asset(), 10 * ONE_RND).unwrap();

        assert_eq!(ledger.current_value(&alice(), &asset()).unwrap(), 110 * ONE_RND);
        assert_eq!(ledger.current_value(&alice(), &other).unwrap(), 100 * ONE_RND);
        assert_eq!(ledger.custody().vault_balance(&vault_address(&other)), 100 * ONE_RND);
    }
}
