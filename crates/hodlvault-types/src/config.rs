//! Vault configuration.
//!
//! Loaded from JSON; every field has a default so an empty object `{}` is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, VaultError, constants};

/// Where the value of a force-released position goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationPolicy {
    /// Pay the released amount to the position's beneficiary.
    #[default]
    ReturnToBeneficiary,
    /// Pay the released amount to the operator.
    Operator,
}

impl std::fmt::Display for LiquidationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReturnToBeneficiary => write!(f, "RETURN_TO_BENEFICIARY"),
            Self::Operator => write!(f, "OPERATOR"),
        }
    }
}

/// Configuration for a single vault instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Destination of force-released value.
    pub liquidation_policy: LiquidationPolicy,
    /// Length of a lock day in seconds.
    pub seconds_per_day: u64,
    /// Optional upper bound on `lock_days`. `None` leaves it unbounded
    /// (the release time is still overflow-checked).
    pub max_lock_days: Option<u64>,
    /// Events retained before the oldest are evicted.
    pub event_log_capacity: usize,
    /// Nonces remembered per signer.
    pub max_nonces_per_signer: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            liquidation_policy: LiquidationPolicy::default(),
            seconds_per_day: constants::SECONDS_PER_DAY,
            max_lock_days: None,
            event_log_capacity: constants::DEFAULT_EVENT_LOG_CAPACITY,
            max_nonces_per_signer: constants::MAX_NONCE_ENTRIES_PER_SIGNER,
        }
    }
}

impl VaultConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| VaultError::Configuration(format!("invalid config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Reject configurations the vault cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.seconds_per_day == 0 {
            return Err(VaultError::Configuration(
                "seconds_per_day must be > 0".into(),
            ));
        }
        if self.event_log_capacity == 0 {
            return Err(VaultError::Configuration(
                "event_log_capacity must be > 0".into(),
            ));
        }
        if self.max_nonces_per_signer == 0 {
            return Err(VaultError::Configuration(
                "max_nonces_per_signer must be > 0".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_liquidation_policy(mut self, policy: LiquidationPolicy) -> Self {
        self.liquidation_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = VaultConfig::default();
        assert_eq!(cfg.seconds_per_day, 86_400);
        assert_eq!(cfg.liquidation_policy, LiquidationPolicy::ReturnToBeneficiary);
        assert!(cfg.max_lock_days.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_json_is_default() {
        let cfg = VaultConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, VaultConfig::default());
    }

    #[test]
    fn partial_json_overrides() {
        let cfg = VaultConfig::from_json_str(
            r#"{"liquidation_policy":"operator","max_lock_days":3650}"#,
        )
        .unwrap();
        assert_eq!(cfg.liquidation_policy, LiquidationPolicy::Operator);
        assert_eq!(cfg.max_lock_days, Some(3650));
        assert_eq!(cfg.seconds_per_day, 86_400);
    }

    #[test]
    fn zero_day_length_rejected() {
        let err = VaultConfig::from_json_str(r#"{"seconds_per_day":0}"#).unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }

    #[test]
    fn malformed_json_rejected() {
        let err = VaultConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = VaultConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, VaultError::Io(_)));
    }
}
