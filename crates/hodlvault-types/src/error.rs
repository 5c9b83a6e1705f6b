//! Error types for the HodlVault ledger.
//!
//! All errors use the `HV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Position errors
//! - 2xx: Access control errors
//! - 3xx: Value flow errors
//! - 4xx: Accounting errors
//! - 5xx: Call authentication errors
//! - 9xx: General / internal errors
//!
//! Every error is terminal for the call that raised it: the call reverts and
//! the ledger is left exactly as it was before the call.

use thiserror::Error;

use crate::{Amount, Identity, Timestamp};

/// How a rejected inbound transfer reached the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    /// Plain value transfer with no call data.
    Bare,
    /// Value or call data that matches no entry point.
    UnknownCall,
}

impl std::fmt::Display for InboundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bare => write!(f, "vault does not accept value"),
            Self::UnknownCall => write!(f, "vault does not accept value or invalid call"),
        }
    }
}

/// Central error enum for all HodlVault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    // =================================================================
    // Position Errors (1xx)
    // =================================================================
    /// A position cannot be created with zero attached value.
    #[error("HV_ERR_100: Invalid amount: cannot lock zero value")]
    InvalidAmount,

    /// Positions cannot be created for the null identity.
    #[error("HV_ERR_101: Invalid beneficiary: cannot lock value for the null identity")]
    InvalidBeneficiary,

    /// The beneficiary already holds an active position.
    #[error("HV_ERR_102: Beneficiary {beneficiary} already has an active position")]
    PositionAlreadyActive { beneficiary: Identity },

    /// The position index is outside the beneficiary's ledger entry.
    #[error("HV_ERR_103: Position not found: index {index}, beneficiary has {len}")]
    PositionNotFound { index: usize, len: usize },

    /// Self-service withdrawal attempted before the release time.
    #[error("HV_ERR_104: Position not matured: releases at {release_time}, now {now}")]
    NotMatured {
        release_time: Timestamp,
        now: Timestamp,
    },

    /// `now + days × seconds_per_day` does not fit, or exceeds the configured cap.
    #[error("HV_ERR_105: Lock duration of {days} days is out of range")]
    LockDurationOverflow { days: u64 },

    // =================================================================
    // Access Control Errors (2xx)
    // =================================================================
    /// Only the beneficiary may withdraw their own position.
    #[error("HV_ERR_200: Caller {caller} is not the beneficiary")]
    NotBeneficiary { caller: Identity },

    /// Operator-only operation invoked by someone else.
    #[error("HV_ERR_201: Caller {caller} is not the operator")]
    NotOperator { caller: Identity },

    // =================================================================
    // Value Flow Errors (3xx)
    // =================================================================
    /// Value sent to the vault outside of position creation.
    #[error("HV_ERR_300: Direct transfer rejected: {kind}")]
    DirectTransferRejected { kind: InboundKind },

    /// The recipient refused an outbound transfer.
    #[error("HV_ERR_301: Transfer of {amount} to {recipient} failed: {reason}")]
    TransferFailed {
        recipient: Identity,
        amount: Amount,
        reason: String,
    },

    /// A balance or total would overflow.
    #[error("HV_ERR_302: Amount overflow")]
    AmountOverflow,

    /// The caller could not fund the value attached to its call.
    #[error("HV_ERR_303: Caller {payer} cannot fund {amount}: {reason}")]
    InsufficientFunds {
        payer: Identity,
        amount: Amount,
        reason: String,
    },

    // =================================================================
    // Accounting Errors (4xx)
    // =================================================================
    /// Custodied balance fell below the locked total. Critical safety alert.
    #[error("HV_ERR_400: Solvency invariant violation: {reason}")]
    SolvencyViolation { reason: String },

    /// A persisted snapshot is internally inconsistent.
    #[error("HV_ERR_401: Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    // =================================================================
    // Call Authentication Errors (5xx)
    // =================================================================
    /// The ed25519 signature on a call did not verify.
    #[error("HV_ERR_500: Call signature verification failed")]
    InvalidSignature,

    /// The signer already used this nonce.
    #[error("HV_ERR_501: Nonce replay detected for signer {signer} nonce {nonce}")]
    NonceReplay { signer: Identity, nonce: u64 },

    /// The signer exhausted its nonce quota.
    #[error("HV_ERR_502: Nonce quota of {limit} exceeded for signer {signer}")]
    NonceQuotaExceeded { signer: Identity, limit: usize },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("HV_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("HV_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("HV_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("HV_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, VaultError>;

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
