//! Durable vault state.
//!
//! A [`VaultSnapshot`] holds everything that must survive across process
//! restarts: the operator, the custodied balance, the locked total and every
//! beneficiary's positions. Restoring validates the snapshot before any
//! ledger is built from it.

use chrono::{DateTime, Utc};
use hodlvault_types::{Amount, Identity, Position, Result, VaultError};
use serde::{Deserialize, Serialize};

use crate::position_ledger::PositionLedger;

/// Positions of one beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryEntry {
    pub beneficiary: Identity,
    pub positions: Vec<Position>,
}

/// Serializable vault state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub operator: Identity,
    pub custodied_balance: Amount,
    pub locked_total: Amount,
    /// Sorted by beneficiary so equal states serialize identically.
    pub entries: Vec<BeneficiaryEntry>,
    pub taken_at: DateTime<Utc>,
}

impl VaultSnapshot {
    /// Capture the current state.
    #[must_use]
    pub fn capture(operator: Identity, ledger: &PositionLedger, custodied_balance: Amount) -> Self {
        let mut entries: Vec<BeneficiaryEntry> = ledger
            .iter()
            .map(|(beneficiary, positions)| BeneficiaryEntry {
                beneficiary: *beneficiary,
                positions: positions.to_vec(),
            })
            .collect();
        entries.sort_by_key(|e| e.beneficiary);
        Self {
            operator,
            custodied_balance,
            locked_total: ledger.locked_total(),
            entries,
            taken_at: Utc::now(),
        }
    }

    /// Validate the snapshot and rebuild its ledger.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidSnapshot`] if the operator is null, the
    /// recorded locked total disagrees with the positions, or the custodied
    /// balance does not cover the locked total.
    pub fn to_ledger(&self) -> Result<PositionLedger> {
        if self.operator.is_null() {
            return Err(VaultError::InvalidSnapshot {
                reason: "operator is the null identity".into(),
            });
        }
        let ledger = PositionLedger::from_entries(
            self.entries
                .iter()
                .map(|e| (e.beneficiary, e.positions.clone())),
        )?;
        if ledger.locked_total() != self.locked_total {
            tracing::warn!(
                recorded = %self.locked_total,
                actual = %ledger.locked_total(),
                "Snapshot locked total mismatch"
            );
            return Err(VaultError::InvalidSnapshot {
                reason: format!(
                    "recorded locked total {} != sum of positions {}",
                    self.locked_total,
                    ledger.locked_total()
                ),
            });
        }
        if self.custodied_balance < self.locked_total {
            return Err(VaultError::InvalidSnapshot {
                reason: format!(
                    "custodied balance {} < locked total {}",
                    self.custodied_balance, self.locked_total
                ),
            });
        }
        Ok(ledger)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
