//! Identifiers and scalar units used throughout HodlVault.
//!
//! An [`Identity`] is a 20-byte account handle. Signers derive theirs from
//! an ed25519 public key; the all-zero identity is the null identity and can
//! never own a position.

use std::{fmt, str::FromStr};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{VaultError, constants};

/// Units of native value. The vault is single-asset.
pub type Amount = u128;

/// Absolute time in unix seconds.
pub type Timestamp = u64;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Account identity: depositors, beneficiaries and the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Identity(pub [u8; constants::IDENTITY_LEN]);

impl Identity {
    /// The null identity. Positions can never be created for it.
    pub const NULL: Self = Self([0u8; constants::IDENTITY_LEN]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; constants::IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive the identity controlled by an ed25519 key:
    /// the last 20 bytes of `SHA-256(domain || pubkey)`.
    #[must_use]
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        Self::from_pubkey_bytes(key.as_bytes())
    }

    #[must_use]
    pub fn from_pubkey_bytes(pubkey: &[u8; 32]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::IDENTITY_DOMAIN);
        hasher.update(pubkey);
        let hash = hasher.finalize();
        let mut bytes = [0u8; constants::IDENTITY_LEN];
        bytes.copy_from_slice(&hash[32 - constants::IDENTITY_LEN..]);
        Self(bytes)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; constants::IDENTITY_LEN]
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; constants::IDENTITY_LEN] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Identity {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits)
            .map_err(|e| VaultError::Serialization(format!("identity {s}: {e}")))?;
        let bytes: [u8; constants::IDENTITY_LEN] = raw.try_into().map_err(|raw: Vec<u8>| {
            VaultError::Serialization(format!(
                "identity {s}: expected {} bytes, got {}",
                constants::IDENTITY_LEN,
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

/// Random identity for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Identity {
    #[must_use]
    pub fn random() -> Self {
        let mut bytes: [u8; constants::IDENTITY_LEN] = rand::random();
        // Keep clear of the null identity.
        bytes[0] |= 1;
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
