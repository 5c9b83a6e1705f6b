//! Value moving between callers and the vault.
//!
//! The vault pays beneficiaries and the operator through a [`Bank`]. A
//! recipient may refuse a transfer; the vault then reverts the whole call.
//! The dispatcher collects the value a signed call attaches from the
//! signer's balance before the vault sees it.
//! The bank only sees `(identity, amount)` and never holds a handle to the
//! vault, so a payout cannot re-enter the ledger mid-call.

use std::collections::{HashMap, HashSet};

use hodlvault_types::{Amount, Identity};

/// A transfer into or out of the vault was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRejected {
    pub reason: String,
}

impl std::fmt::Display for TransferRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

/// Balances outside the vault.
pub trait Bank {
    /// Deliver `amount` to `to`.
    fn transfer(&mut self, to: Identity, amount: Amount) -> Result<(), TransferRejected>;

    /// Take `amount` from `from`, to be attached to a call.
    fn collect(&mut self, from: Identity, amount: Amount) -> Result<(), TransferRejected>;

    /// Give back value taken by [`collect`](Self::collect) for a call that
    /// failed. Never refused.
    fn refund(&mut self, to: Identity, amount: Amount);
}

/// In-process bank: per-identity balances and a set of identities that
/// refuse incoming value.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
    balances: HashMap<Identity, Amount>,
    rejecting: HashSet<Identity>,
}

impl InMemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `who` from outside the system.
    pub fn fund(&mut self, who: Identity, amount: Amount) {
        let balance = self.balances.entry(who).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Make `who` refuse all further transfers.
    pub fn reject_transfers_to(&mut self, who: Identity) {
        self.rejecting.insert(who);
    }

    /// Make `who` accept transfers again.
    pub fn accept_transfers_to(&mut self, who: Identity) {
        self.rejecting.remove(&who);
    }

    #[must_use]
    pub fn balance_of(&self, who: &Identity) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    /// Sum of every balance, `None` if it does not fit in an [`Amount`].
    #[must_use]
    pub fn total_balance(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0, |acc: Amount, b| acc.checked_add(*b))
    }
}

impl Bank for InMemoryBank {
    fn transfer(&mut self, to: Identity, amount: Amount) -> Result<(), TransferRejected> {
        if self.rejecting.contains(&to) {
            return Err(TransferRejected {
                reason: format!("{to} does not accept value"),
            });
        }
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or_else(|| TransferRejected {
            reason: format!("{to} balance would overflow"),
        })?;
        Ok(())
    }

    fn collect(&mut self, from: Identity, amount: Amount) -> Result<(), TransferRejected> {
        let available = self.balance_of(&from);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| TransferRejected {
                reason: format!("{from} holds {available}, needs {amount}"),
            })?;
        self.balances.insert(from, remaining);
        Ok(())
    }

    fn refund(&mut self, to: Identity, amount: Amount) {
        self.fund(to, amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_credits_recipient() {
        let mut bank = InMemoryBank::new();
        let alice = Identity::random();
        bank.transfer(alice, 10).unwrap();
        bank.transfer(alice, 5).unwrap();
        assert_eq!(bank.balance_of(&alice), 15);
        assert_eq!(bank.total_balance(), Some(15));
    }

    #[test]
    fn rejecting_recipient_refuses() {
        let mut bank = InMemoryBank::new();
        let alice = Identity::random();
        bank.reject_transfers_to(alice);
        assert!(bank.transfer(alice, 10).is_err());
        assert_eq!(bank.balance_of(&alice), 0);

        bank.accept_transfers_to(alice);
        assert!(bank.transfer(alice, 10).is_ok());
    }

    #[test]
    fn collect_requires_funds() {
        let mut bank = InMemoryBank::new();
        let alice = Identity::random();
        assert!(bank.collect(alice, 1).is_err());

        bank.fund(alice, 100);
        bank.collect(alice, 60).unwrap();
        assert_eq!(bank.balance_of(&alice), 40);
        assert!(bank.collect(alice, 41).is_err());
        assert_eq!(bank.balance_of(&alice), 40);

        bank.refund(alice, 60);
        assert_eq!(bank.balance_of(&alice), 100);
    }

    #[test]
    fn refund_ignores_rejection() {
        let mut bank = InMemoryBank::new();
        let alice = Identity::random();
        bank.fund(alice, 5);
        bank.collect(alice, 5).unwrap();
        bank.reject_transfers_to(alice);
        bank.refund(alice, 5);
        assert_eq!(bank.balance_of(&alice), 5);
    }

    #[test]
    fn total_balance_reports_overflow() {
        let mut bank = InMemoryBank::new();
        bank.fund(Identity::random(), Amount::MAX);
        bank.fund(Identity::random(), 1);
        assert_eq!(bank.total_balance(), None);
    }
}
