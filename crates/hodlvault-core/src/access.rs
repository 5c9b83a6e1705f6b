//! Per-operation access control.
//!
//! There is no role hierarchy: each operation names the one identity allowed
//! to call it, and the check is an equality test against the caller.

use hodlvault_types::{Identity, Result, VaultError};

/// Who an operation is reserved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The vault's operator.
    Operator,
    /// The beneficiary that owns the targeted position.
    Beneficiary(Identity),
}

impl Role {
    /// Check `caller` against the role.
    ///
    /// # Errors
    /// - `NotOperator` if the role is `Operator` and `caller != operator`
    /// - `NotBeneficiary` if the role is `Beneficiary(b)` and `caller != b`
    pub fn authorize(self, caller: Identity, operator: Identity) -> Result<()> {
        match self {
            Self::Operator if caller == operator => Ok(()),
            Self::Operator => Err(VaultError::NotOperator { caller }),
            Self::Beneficiary(owner) if caller == owner => Ok(()),
            Self::Beneficiary(_) => Err(VaultError::NotBeneficiary { caller }),
        }
    }
}
