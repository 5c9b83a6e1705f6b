//! Solvency invariant checker.
//!
//! Two invariants are enforced after every state-changing operation:
//! ```text
//! custodied_balance == opening + inflows − outflows
//! custodied_balance >= locked_total
//! ```
//!
//! The first catches bookkeeping drift in the custody account; the second
//! is the promise made to every beneficiary. Sweepable excess is always
//! `custodied_balance − locked_total`, never the raw balance.
//!
//! Only the net expected balance is tracked. Lifetime flow totals would
//! overflow long before the balance itself does.

use hodlvault_types::{Amount, Result, VaultError};

/// Tracks the balance custody should hold, flow by flow.
#[derive(Debug, Clone, Default)]
pub struct SolvencyTracker {
    /// Net balance implied by every recorded flow since the opening balance.
    expected: Amount,
}

impl SolvencyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker resuming from a known balance.
    #[must_use]
    pub fn resume(opening: Amount) -> Self {
        Self { expected: opening }
    }

    /// Value accepted through position creation.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if the expected balance would overflow.
    pub fn record_deposit(&mut self, amount: Amount) -> Result<()> {
        self.inflow(amount)
    }

    /// Value that arrived without passing the inbound guard.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if the expected balance would overflow.
    pub fn record_injection(&mut self, amount: Amount) -> Result<()> {
        self.inflow(amount)
    }

    /// Value paid to a beneficiary on self-service release.
    ///
    /// # Errors
    /// Returns `SolvencyViolation` if more leaves than is expected to be held.
    pub fn record_withdrawal(&mut self, amount: Amount) -> Result<()> {
        self.outflow(amount, "withdrawal")
    }

    /// Value paid out on forced release.
    ///
    /// # Errors
    /// Returns `SolvencyViolation` if more leaves than is expected to be held.
    pub fn record_liquidation(&mut self, amount: Amount) -> Result<()> {
        self.outflow(amount, "liquidation")
    }

    /// Value swept to the operator.
    ///
    /// # Errors
    /// Returns `SolvencyViolation` if more leaves than is expected to be held.
    pub fn record_sweep(&mut self, amount: Amount) -> Result<()> {
        self.outflow(amount, "sweep")
    }

    fn inflow(&mut self, amount: Amount) -> Result<()> {
        self.expected = self
            .expected
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        Ok(())
    }

    fn outflow(&mut self, amount: Amount, kind: &str) -> Result<()> {
        self.expected =
            self.expected
                .checked_sub(amount)
                .ok_or_else(|| VaultError::SolvencyViolation {
                    reason: format!(
                        "{kind} of {amount} exceeds expected balance {}",
                        self.expected
                    ),
                })?;
        Ok(())
    }

    /// Balance implied by the recorded flows.
    #[must_use]
    pub fn expected_balance(&self) -> Amount {
        self.expected
    }

    /// Verify both invariants against the actual custody balance.
    ///
    /// # Errors
    /// Returns [`VaultError::SolvencyViolation`] if either invariant fails.
    pub fn verify(&self, custodied: Amount, locked_total: Amount) -> Result<()> {
        if custodied != self.expected {
            return Err(VaultError::SolvencyViolation {
                reason: format!(
                    "custody balance {custodied} != expected {}",
                    self.expected
                ),
            });
        }
        if custodied < locked_total {
            return Err(VaultError::SolvencyViolation {
                reason: format!("custody balance {custodied} < locked total {locked_total}"),
            });
        }
        Ok(())
    }

    /// Value that backs no position: `custodied − locked_total`.
    ///
    /// # Errors
    /// Returns [`VaultError::SolvencyViolation`] if custody is below the
    /// locked total.
    pub fn excess(custodied: Amount, locked_total: Amount) -> Result<Amount> {
        custodied
            .checked_sub(locked_total)
            .ok_or_else(|| VaultError::SolvencyViolation {
                reason: format!("custody balance {custodied} < locked total {locked_total}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_is_solvent() {
        let t = SolvencyTracker::new();
        assert_eq!(t.expected_balance(), 0);
        assert!(t.verify(0, 0).is_ok());
    }

    #[test]
    fn flows_add_up() {
        let mut t = SolvencyTracker::new();
        t.record_deposit(1_200).unwrap();
        t.record_injection(2_000).unwrap();
        t.record_withdrawal(200).unwrap();
        t.record_sweep(2_000).unwrap();
        assert_eq!(t.expected_balance(), 1_000);
        assert!(t.verify(1_000, 1_000).is_ok());
    }

    #[test]
    fn drifted_balance_detected() {
        let mut t = SolvencyTracker::new();
        t.record_deposit(100).unwrap();
        let err = t.verify(101, 100).unwrap_err();
        assert!(matches!(err, VaultError::SolvencyViolation { .. }));
    }

    #[test]
    fn under_collateralised_detected() {
        let mut t = SolvencyTracker::new();
        t.record_deposit(100).unwrap();
        let err = t.verify(100, 150).unwrap_err();
        assert!(matches!(err, VaultError::SolvencyViolation { .. }));
    }

    #[test]
    fn outflow_beyond_expected_rejected() {
        let mut t = SolvencyTracker::new();
        t.record_deposit(10).unwrap();
        let err = t.record_liquidation(11).unwrap_err();
        assert!(matches!(err, VaultError::SolvencyViolation { .. }));
        assert_eq!(t.expected_balance(), 10);
    }

    #[test]
    fn inflow_overflow_rejected() {
        let mut t = SolvencyTracker::resume(Amount::MAX);
        let err = t.record_injection(1).unwrap_err();
        assert!(matches!(err, VaultError::AmountOverflow));
        assert_eq!(t.expected_balance(), Amount::MAX);
    }

    #[test]
    fn lifetime_flows_beyond_amount_max_stay_consistent() {
        let half = 1u128 << 127;
        let mut t = SolvencyTracker::new();
        for _ in 0..4 {
            t.record_deposit(half).unwrap();
            t.record_withdrawal(half).unwrap();
        }
        assert_eq!(t.expected_balance(), 0);
        assert!(t.verify(0, 0).is_ok());
        t.record_deposit(half).unwrap();
        assert!(t.verify(half, half).is_ok());
    }

    #[test]
    fn excess_is_balance_minus_locked() {
        assert_eq!(SolvencyTracker::excess(3_200, 1_200).unwrap(), 2_000);
        assert_eq!(SolvencyTracker::excess(1_200, 1_200).unwrap(), 0);
        assert!(SolvencyTracker::excess(1_000, 1_200).is_err());
    }

    #[test]
    fn resume_counts_opening_balance() {
        let mut t = SolvencyTracker::resume(500);
        t.record_withdrawal(200).unwrap();
        assert_eq!(t.expected_balance(), 300);
        assert!(t.verify(300, 300).is_ok());
    }
}
