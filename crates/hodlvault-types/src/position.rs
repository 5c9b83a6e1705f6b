//! # Position: one time-locked obligation
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  release / force release   ┌──────────┐
//!   │ ACTIVE ├───────────────────────────▶│ INACTIVE │
//!   └────────┘                            └──────────┘
//!   amount > 0                             amount == 0
//! ```
//!
//! The transition is one-way. A closed slot is never reopened; a new
//! position for the same beneficiary gets a fresh slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, Timestamp};

/// A single custodied obligation owed to a beneficiary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Value owed. Zero means the slot is inactive.
    pub amount: Amount,
    /// Unix time from which the beneficiary may self-withdraw.
    pub release_time: Timestamp,
}

impl Position {
    #[must_use]
    pub fn new(amount: Amount, release_time: Timestamp) -> Self {
        Self {
            amount,
            release_time,
        }
    }

    /// Returns `true` while the position still backs an obligation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.amount > 0
    }

    /// Returns `true` once `now` has reached the release time.
    #[must_use]
    pub fn is_matured(&self, now: Timestamp) -> bool {
        now >= self.release_time
    }

    /// Seconds until maturity, zero once matured.
    #[must_use]
    pub fn remaining_lock(&self, now: Timestamp) -> u64 {
        self.release_time.saturating_sub(now)
    }

    /// Release time as a calendar timestamp, if representable.
    #[must_use]
    pub fn release_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.release_time).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_active() {
            write!(f, "ACTIVE({} until {})", self.amount, self.release_time)
        } else {
            write!(f, "INACTIVE")
        }
    }
}
