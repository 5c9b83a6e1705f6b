//! Ledger stores working together without the vault on top: the same
//! bookkeeping the vault performs, step by step.

use hodlvault_ledger::{Custody, EventLog, PositionLedger, SolvencyTracker, VaultSnapshot};
use hodlvault_types::*;

#[test]
fn deposit_withdraw_sweep_bookkeeping() {
    let mut ledger = PositionLedger::new();
    let mut custody = Custody::new();
    let mut solvency = SolvencyTracker::new();
    let mut events = EventLog::new(8);
    let alice = Identity::random();

    // Lock 1_000 for alice.
    ledger.open(alice, 1_000, 50).unwrap();
    custody.credit(1_000).unwrap();
    solvency.record_deposit(1_000).unwrap();
    events.append(
        VaultEvent::PositionCreated {
            beneficiary: alice,
            amount: 1_000,
            release_time: 50,
        },
        0,
    );
    solvency.verify(custody.balance(), ledger.locked_total()).unwrap();

    // Someone forces 300 in.
    custody.credit(300).unwrap();
    solvency.record_injection(300).unwrap();
    assert_eq!(
        SolvencyTracker::excess(custody.balance(), ledger.locked_total()).unwrap(),
        300
    );

    // Alice withdraws.
    let closed = ledger.close(&alice, 0).unwrap();
    custody.debit(closed.amount).unwrap();
    solvency.record_withdrawal(closed.amount).unwrap();
    events.append(
        VaultEvent::PositionWithdrawn {
            beneficiary: alice,
            amount: closed.amount,
            withdrawn_at: 50,
        },
        50,
    );
    solvency.verify(custody.balance(), ledger.locked_total()).unwrap();

    // Operator sweeps the rest.
    let excess = SolvencyTracker::excess(custody.balance(), ledger.locked_total()).unwrap();
    custody.debit(excess).unwrap();
    solvency.record_sweep(excess).unwrap();
    solvency.verify(custody.balance(), ledger.locked_total()).unwrap();

    assert_eq!(custody.balance(), 0);
    assert_eq!(solvency.expected_balance(), 0);
    assert_eq!(closed.amount + excess, 1_300);
    assert!(events.verify_chain().is_ok());
}

#[test]
fn snapshot_rejects_tampered_locked_total() {
    let mut ledger = PositionLedger::new();
    ledger.open(Identity::random(), 700, 10).unwrap();
    let mut snapshot = VaultSnapshot::capture(Identity::random(), &ledger, 700);
    assert!(snapshot.to_ledger().is_ok());

    snapshot.locked_total = 100;
    let json = snapshot.to_json().unwrap();
    let reloaded = VaultSnapshot::from_json(&json).unwrap();
    assert!(matches!(
        reloaded.to_ledger(),
        Err(VaultError::InvalidSnapshot { .. })
    ));
}
