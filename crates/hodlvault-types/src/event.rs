//! Events emitted by vault operations.
//!
//! Observers read these from the ledger's event log. Each variant carries
//! exactly what an off-chain watcher needs to reconcile its own view.

use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, Timestamp};

/// A state transition observed by the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// A new position was locked.
    PositionCreated {
        beneficiary: Identity,
        amount: Amount,
        release_time: Timestamp,
    },
    /// A beneficiary withdrew a matured position.
    PositionWithdrawn {
        beneficiary: Identity,
        amount: Amount,
        withdrawn_at: Timestamp,
    },
    /// The operator force-released a position.
    PositionLiquidated {
        beneficiary: Identity,
        amount: Amount,
        recipient: Identity,
        liquidated_at: Timestamp,
    },
}

impl VaultEvent {
    /// The beneficiary the event concerns.
    #[must_use]
    pub fn beneficiary(&self) -> Identity {
        match self {
            Self::PositionCreated { beneficiary, .. }
            | Self::PositionWithdrawn { beneficiary, .. }
            | Self::PositionLiquidated { beneficiary, .. } => *beneficiary,
        }
    }

    /// Value moved by the event.
    #[must_use]
    pub fn amount(&self) -> Amount {
        match self {
            Self::PositionCreated { amount, .. }
            | Self::PositionWithdrawn { amount, .. }
            | Self::PositionLiquidated { amount, .. } => *amount,
        }
    }
}

impl std::fmt::Display for VaultEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PositionCreated { .. } => write!(f, "POSITION_CREATED"),
            Self::PositionWithdrawn { .. } => write!(f, "POSITION_WITHDRAWN"),
            Self::PositionLiquidated { .. } => write!(f, "POSITION_LIQUIDATED"),
        }
    }
}
