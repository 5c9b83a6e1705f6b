//! # Randomized Solvency Tests
//!
//! Drives the vault through long random sequences of creates, releases,
//! liquidations, sweeps, forced injections and refused payouts, checking
//! after every step that:
//!
//! - `custodied_balance >= locked_total`
//! - the locked total equals the sum of active positions
//! - no beneficiary ever holds more than one active position
//! - value is conserved: `custodied + paid_out == deposited + injected`
//! - the solvency tracker expects exactly what custody holds

use hodlvault_core::{CallContext, HodlVault, InMemoryBank, ManualClock};
use hodlvault_types::*;
use rand::{Rng, SeedableRng, rngs::StdRng};

const STEPS: usize = 2_000;

fn check_invariants(
    vault: &HodlVault<ManualClock, InMemoryBank>,
    beneficiaries: &[Identity],
    inflow: Amount,
) {
    assert!(vault.custodied_balance() >= vault.locked_total());
    assert_eq!(
        vault.ledger().recompute_locked_total(),
        Some(vault.locked_total())
    );
    for b in beneficiaries {
        let active = vault.positions_of(b).iter().filter(|p| p.is_active()).count();
        assert!(active <= 1, "{b} holds {active} active positions");
    }
    let paid = vault.bank().total_balance().unwrap();
    assert_eq!(vault.custodied_balance() + paid, inflow);
    let solvency = vault.solvency();
    assert_eq!(solvency.expected_balance(), vault.custodied_balance());
    assert!(
        solvency
            .verify(vault.custodied_balance(), vault.locked_total())
            .is_ok()
    );
}

fn run(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let clock = ManualClock::new(1_600_000_000);
    let operator = Identity::random();
    let mut vault = HodlVault::new(
        operator,
        VaultConfig::default(),
        clock.clone(),
        InMemoryBank::new(),
    )
    .unwrap();
    let beneficiaries: Vec<Identity> = (0..6).map(|_| Identity::random()).collect();
    let mut inflow: Amount = 0;

    for _ in 0..STEPS {
        let who = beneficiaries[rng.gen_range(0..beneficiaries.len())];
        match rng.gen_range(0..8) {
            0 | 1 => {
                let amount: Amount = rng.gen_range(0..5_000);
                let days = rng.gen_range(0..20);
                let ctx = CallContext::new(Identity::random(), amount);
                let locked_before = vault.locked_total();
                match vault.create_position(&ctx, who, days) {
                    Ok(_) => {
                        assert_eq!(vault.locked_total(), locked_before + amount);
                        inflow += amount;
                    }
                    Err(VaultError::InvalidAmount) => assert_eq!(amount, 0),
                    Err(VaultError::PositionAlreadyActive { .. }) => {}
                    Err(e) => panic!("unexpected create error: {e}"),
                }
            }
            2 | 3 => {
                let len = vault.positions_of(&who).len();
                if len > 0 {
                    let index = rng.gen_range(0..len);
                    let _ = vault.release_position(&CallContext::valueless(who), who, index);
                }
            }
            4 => {
                let len = vault.positions_of(&who).len();
                if len > 0 {
                    let index = rng.gen_range(0..len);
                    let _ = vault.force_release(&CallContext::valueless(operator), who, index);
                }
            }
            5 => {
                let excess = vault.excess();
                let swept = vault.sweep_excess(&CallContext::valueless(operator));
                if let Ok(amount) = swept {
                    assert_eq!(amount, excess);
                }
            }
            6 => {
                let amount: Amount = rng.gen_range(1..1_000);
                vault.absorb_forced_transfer(amount).unwrap();
                inflow += amount;
            }
            _ => {
                clock.advance(rng.gen_range(0..3 * 86_400));
                if rng.gen_range(0..4) == 0 {
                    vault.bank_mut().reject_transfers_to(who);
                } else {
                    vault.bank_mut().accept_transfers_to(who);
                }
            }
        }
        check_invariants(&vault, &beneficiaries, inflow);
    }
}

#[test]
fn random_sequences_preserve_solvency() {
    for seed in [1, 7, 42, 1_337, 9_001] {
        run(seed);
    }
}
