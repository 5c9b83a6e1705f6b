//! Position ledger: per-beneficiary position slots plus the locked total.
//!
//! The locked total is the source of truth for what the vault owes. It is
//! only ever moved by [`PositionLedger::open`] and [`PositionLedger::close`]
//! (and their undo counterparts used when a call has to revert), never set
//! directly. All mutations are atomic: either the full operation succeeds or
//! the ledger is unchanged.

use std::collections::HashMap;

use hodlvault_types::{Amount, Identity, Position, Result, Timestamp, VaultError};

/// What [`PositionLedger::close`] removed, kept so a failed payout can be
/// undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedPosition {
    pub beneficiary: Identity,
    pub index: usize,
    /// Amount that was active in the slot. Zero if the slot was already closed.
    pub amount: Amount,
    pub release_time: Timestamp,
}

/// Per-beneficiary positions and the running locked total.
#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    /// Positions per beneficiary, in creation order.
    entries: HashMap<Identity, Vec<Position>>,
    /// Sum of `amount` over every active position.
    locked_total: Amount,
}

impl PositionLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            locked_total: 0,
        }
    }

    /// Rebuild a ledger from persisted entries, recomputing the locked total.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidSnapshot`] if an entry belongs to the null
    /// identity, holds more than one active position, or the total overflows.
    pub fn from_entries(entries: impl IntoIterator<Item = (Identity, Vec<Position>)>) -> Result<Self> {
        let mut ledger = Self::new();
        for (beneficiary, positions) in entries {
            if beneficiary.is_null() {
                return Err(VaultError::InvalidSnapshot {
                    reason: "positions recorded for the null identity".into(),
                });
            }
            let active = positions.iter().filter(|p| p.is_active()).count();
            if active > 1 {
                return Err(VaultError::InvalidSnapshot {
                    reason: format!("{beneficiary} has {active} active positions"),
                });
            }
            for pos in &positions {
                ledger.locked_total = ledger.locked_total.checked_add(pos.amount).ok_or_else(|| {
                    VaultError::InvalidSnapshot {
                        reason: "locked total overflows".into(),
                    }
                })?;
            }
            if ledger.entries.insert(beneficiary, positions).is_some() {
                return Err(VaultError::InvalidSnapshot {
                    reason: format!("{beneficiary} listed twice"),
                });
            }
        }
        Ok(ledger)
    }

    /// All positions of a beneficiary in creation order. Empty if none.
    #[must_use]
    pub fn positions_of(&self, beneficiary: &Identity) -> &[Position] {
        self.entries.get(beneficiary).map_or(&[], Vec::as_slice)
    }

    /// Look up one slot.
    ///
    /// # Errors
    /// Returns [`VaultError::PositionNotFound`] if `index` is out of range.
    pub fn get(&self, beneficiary: &Identity, index: usize) -> Result<&Position> {
        let slots = self.positions_of(beneficiary);
        slots.get(index).ok_or(VaultError::PositionNotFound {
            index,
            len: slots.len(),
        })
    }

    /// Index of the beneficiary's active position, if any.
    #[must_use]
    pub fn active_index(&self, beneficiary: &Identity) -> Option<usize> {
        self.positions_of(beneficiary)
            .iter()
            .position(Position::is_active)
    }

    #[must_use]
    pub fn has_active(&self, beneficiary: &Identity) -> bool {
        self.active_index(beneficiary).is_some()
    }

    /// Open a new position in a fresh slot and add it to the locked total.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero
    /// - `InvalidBeneficiary` if `beneficiary` is the null identity
    /// - `PositionAlreadyActive` if the beneficiary already has an active slot
    /// - `AmountOverflow` if the locked total would overflow
    pub fn open(
        &mut self,
        beneficiary: Identity,
        amount: Amount,
        release_time: Timestamp,
    ) -> Result<usize> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if beneficiary.is_null() {
            return Err(VaultError::InvalidBeneficiary);
        }
        if self.has_active(&beneficiary) {
            return Err(VaultError::PositionAlreadyActive { beneficiary });
        }
        let new_total = self
            .locked_total
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;

        let slots = self.entries.entry(beneficiary).or_default();
        slots.push(Position::new(amount, release_time));
        self.locked_total = new_total;
        Ok(slots.len() - 1)
    }

    /// Undo the most recent [`open`](Self::open) for `beneficiary`.
    ///
    /// # Errors
    /// Returns [`VaultError::Internal`] if `index` is not the beneficiary's
    /// last, still active slot.
    pub fn revert_open(&mut self, beneficiary: &Identity, index: usize) -> Result<()> {
        let slots = self
            .entries
            .get_mut(beneficiary)
            .ok_or_else(|| VaultError::Internal(format!("no entry for {beneficiary}")))?;
        if index + 1 != slots.len() || !slots[index].is_active() {
            return Err(VaultError::Internal(format!(
                "slot {index} of {beneficiary} is not the open tail"
            )));
        }
        let amount = slots[index].amount;
        self.locked_total = self
            .locked_total
            .checked_sub(amount)
            .ok_or_else(|| VaultError::Internal("locked total underflow on revert".into()))?;
        slots.pop();
        if slots.is_empty() {
            self.entries.remove(beneficiary);
        }
        Ok(())
    }

    /// Zero a slot and take its amount out of the locked total.
    ///
    /// Closing an already inactive slot succeeds and reports a zero amount.
    ///
    /// # Errors
    /// - `PositionNotFound` if `index` is out of range
    /// - `SolvencyViolation` if the locked total is smaller than the slot
    pub fn close(&mut self, beneficiary: &Identity, index: usize) -> Result<ClosedPosition> {
        let len = self.positions_of(beneficiary).len();
        let slot = self
            .entries
            .get_mut(beneficiary)
            .and_then(|slots| slots.get_mut(index))
            .ok_or(VaultError::PositionNotFound { index, len })?;

        let amount = slot.amount;
        let new_total =
            self.locked_total
                .checked_sub(amount)
                .ok_or_else(|| VaultError::SolvencyViolation {
                    reason: format!(
                        "locked total {} smaller than position {amount}",
                        self.locked_total
                    ),
                })?;

        slot.amount = 0;
        self.locked_total = new_total;
        Ok(ClosedPosition {
            beneficiary: *beneficiary,
            index,
            amount,
            release_time: slot.release_time,
        })
    }

    /// Undo a [`close`](Self::close) whose payout failed.
    ///
    /// # Errors
    /// Returns [`VaultError::Internal`] if the slot no longer matches the
    /// closed record.
    pub fn revert_close(&mut self, closed: &ClosedPosition) -> Result<()> {
        let slot = self
            .entries
            .get_mut(&closed.beneficiary)
            .and_then(|slots| slots.get_mut(closed.index))
            .ok_or_else(|| VaultError::Internal(format!("slot {} vanished", closed.index)))?;
        if slot.amount != 0 || slot.release_time != closed.release_time {
            return Err(VaultError::Internal(format!(
                "slot {} of {} changed since close",
                closed.index, closed.beneficiary
            )));
        }
        self.locked_total = self
            .locked_total
            .checked_add(closed.amount)
            .ok_or(VaultError::AmountOverflow)?;
        slot.amount = closed.amount;
        Ok(())
    }

    /// Sum of every active position.
    #[must_use]
    pub fn locked_total(&self) -> Amount {
        self.locked_total
    }

    /// Locked total recomputed from the slots. `None` on overflow.
    #[must_use]
    pub fn recompute_locked_total(&self) -> Option<Amount> {
        self.entries
            .values()
            .flatten()
            .try_fold(0u128, |acc, p| acc.checked_add(p.amount))
    }

    /// Number of beneficiaries that ever held a position.
    #[must_use]
    pub fn beneficiary_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of currently active positions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.entries
            .values()
            .flatten()
            .filter(|p| p.is_active())
            .count()
    }

    /// Iterate over `(beneficiary, positions)` in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &[Position])> {
        self.entries.iter().map(|(b, slots)| (b, slots.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_records_position_and_total() {
        let mut ledger = PositionLedger::new();
        let alice = Identity::random();
        let idx = ledger.open(alice, 1_000, 50).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(ledger.positions_of(&alice), &[Position::new(1_000, 50)]);
        assert_eq!(ledger.locked_total(), 1_000);
        assert_eq!(ledger.active_index(&alice), Some(0));
    }

    #[test]
    fn unknown_beneficiary_has_no_positions() {
        let ledger = PositionLedger::new();
        assert!(ledger.positions_of(&Identity::random()).is_empty());
    }

    #[test]
    fn open_rejects_zero_and_null() {
        let mut ledger = PositionLedger::new();
        assert!(matches!(
            ledger.open(Identity::random(), 0, 1).unwrap_err(),
            VaultError::InvalidAmount
        ));
        assert!(matches!(
            ledger.open(Identity::NULL, 1, 1).unwrap_err(),
            VaultError::InvalidBeneficiary
        ));
        assert_eq!(ledger.locked_total(), 0);
        assert_eq!(ledger.beneficiary_count(), 0);
    }

    #[test]
    fn second_active_position_rejected() {
        let mut ledger = PositionLedger::new();
        let alice = Identity::random();
        ledger.open(alice, 12, 10).unwrap();
        let err = ledger.open(alice, 256, 20).unwrap_err();
        assert!(matches!(err, VaultError::PositionAlreadyActive { beneficiary } if beneficiary == alice));
        assert_eq!(ledger.positions_of(&alice).len(), 1);
        assert_eq!(ledger.locked_total(), 12);
    }

    #[test]
    fn close_zeroes_and_decrements() {
        let mut ledger = PositionLedger::new();
        let alice = Identity::random();
        ledger.open(alice, 700, 10).unwrap();
        let closed = ledger.close(&alice, 0).unwrap();
        assert_eq!(closed.amount, 700);
        assert_eq!(ledger.positions_of(&alice)[0].amount, 0);
        assert_eq!(ledger.locked_total(), 0);
        assert!(!ledger.has_active(&alice));
    }

    #[test]
    fn reopen_appends_new_slot() {
        let mut ledger = PositionLedger::new();
        let alice = Identity::random();
        ledger.open(alice, 5, 10).unwrap();
        ledger.close(&alice, 0).unwrap();
        let idx = ledger.open(alice, 9, 20).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(ledger.positions_of(&alice)[0], Position::new(0, 10));
        assert_eq!(ledger.positions_of(&alice)[1], Position::new(9, 20));
        assert_eq!(ledger.active_count(), 1);
    }

    #[test]
    fn close_twice_is_zero_amount() {
        let mut ledger = PositionLedger::new();
        let alice = Identity::random();
        ledger.open(alice, 5, 10).unwrap();
        ledger.close(&alice, 0).unwrap();
        let again = ledger.close(&alice, 0).unwrap();
        assert_eq!(again.amount, 0);
        assert_eq!(ledger.locked_total(), 0);
    }

    #[test]
    fn close_out_of_range() {
        let mut ledger = PositionLedger::new();
        let alice = Identity::random();
        ledger.open(alice, 5, 10).unwrap();
        let err = ledger.close(&alice, 3).unwrap_err();
        assert!(matches!(err, VaultError::PositionNotFound { index: 3, len: 1 }));
        let err = ledger.close(&Identity::random(), 0).unwrap_err();
        assert!(matches!(err, VaultError::PositionNotFound { index: 0, len: 0 }));
    }

    #[test]
    fn revert_close_restores_state() {
        let mut ledger = PositionLedger::new();
        let alice = Identity::random();
        ledger.open(alice, 40, 10).unwrap();
        let closed = ledger.close(&alice, 0).unwrap();
        ledger.revert_close(&closed).unwrap();
        assert_eq!(ledger.positions_of(&alice)[0], Position::new(40, 10));
        assert_eq!(ledger.locked_total(), 40);
    }

    #[test]
    fn revert_open_removes_tail() {
        let mut ledger = PositionLedger::new();
        let alice = Identity::random();
        let idx = ledger.open(alice, 40, 10).unwrap();
        ledger.revert_open(&alice, idx).unwrap();
        assert!(ledger.positions_of(&alice).is_empty());
        assert_eq!(ledger.locked_total(), 0);
        assert_eq!(ledger.beneficiary_count(), 0);
    }

    #[test]
    fn locked_total_overflow_rejected() {
        let mut ledger = PositionLedger::new();
        ledger.open(Identity::random(), u128::MAX, 1).unwrap();
        let err = ledger.open(Identity::random(), 1, 1).unwrap_err();
        assert!(matches!(err, VaultError::AmountOverflow));
        assert_eq!(ledger.locked_total(), u128::MAX);
    }

    #[test]
    fn recompute_matches_running_total() {
        let mut ledger = PositionLedger::new();
        let users: Vec<Identity> = (0..5).map(|_| Identity::random()).collect();
        for (i, u) in users.iter().enumerate() {
            ledger.open(*u, (i as u128 + 1) * 100, 10).unwrap();
        }
        ledger.close(&users[2], 0).unwrap();
        assert_eq!(ledger.recompute_locked_total(), Some(ledger.locked_total()));
        assert_eq!(ledger.locked_total(), 100 + 200 + 400 + 500);
    }

    #[test]
    fn from_entries_rejects_double_active() {
        let alice = Identity::random();
        let err = PositionLedger::from_entries(vec![(
            alice,
            vec![Position::new(1, 1), Position::new(2, 2)],
        )])
        .unwrap_err();
        assert!(matches!(err, VaultError::InvalidSnapshot { .. }));
    }

    #[test]
    fn from_entries_computes_total() {
        let ledger = PositionLedger::from_entries(vec![
            (Identity::random(), vec![Position::new(0, 1), Position::new(30, 2)]),
            (Identity::random(), vec![Position::new(12, 3)]),
        ])
        .unwrap();
        assert_eq!(ledger.locked_total(), 42);
        assert_eq!(ledger.active_count(), 2);
    }
}
