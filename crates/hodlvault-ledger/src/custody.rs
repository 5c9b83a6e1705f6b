//! Custody account: the vault's raw native balance.
//!
//! The raw balance is **not** authoritative for what is owed. Value can land
//! here through channels the vault never sees (forced transfers), so the
//! balance is only an upper bound checked against the locked total.

use hodlvault_types::{Amount, Result, VaultError};

/// The vault's own balance of native value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Custody {
    balance: Amount,
}

impl Custody {
    #[must_use]
    pub fn new() -> Self {
        Self { balance: 0 }
    }

    /// Custody account opened with an existing balance (snapshot restore).
    #[must_use]
    pub fn with_balance(balance: Amount) -> Self {
        Self { balance }
    }

    #[must_use]
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Credit value accepted through position creation.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if the balance would overflow.
    pub fn credit(&mut self, amount: Amount) -> Result<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        Ok(())
    }

    /// Debit value leaving the vault.
    ///
    /// # Errors
    /// Returns `SolvencyViolation` if the balance is smaller than `amount`.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        self.balance =
            self.balance
                .checked_sub(amount)
                .ok_or_else(|| VaultError::SolvencyViolation {
                    reason: format!("custody holds {}, cannot pay out {amount}", self.balance),
                })?;
        Ok(())
    }
}
