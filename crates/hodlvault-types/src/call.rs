//! Call envelopes: what a caller asks the vault to do, with attached value.
//!
//! Every state-changing request reaches the vault as a [`SignedCall`]. The
//! signer's ed25519 key authenticates the caller identity; the nonce keeps a
//! captured envelope from being replayed.
//!
//! Signing payload:
//! `"hodlvault:call:v1:" || signer || nonce || value || selector || args`

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, Result, VaultError, constants};

/// The entry point a call targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultCall {
    /// Lock the attached value for `beneficiary` for `lock_days` days.
    CreatePosition { beneficiary: Identity, lock_days: u64 },
    /// Beneficiary withdraws a matured position.
    ReleasePosition { beneficiary: Identity, index: usize },
    /// Operator override: release a position regardless of maturity.
    ForceRelease { beneficiary: Identity, index: usize },
    /// Operator reclaims value not backing any position.
    SweepExcess,
    /// Anything else: a bare transfer (empty data) or unrecognised call data.
    Raw { data: Vec<u8> },
}

impl VaultCall {
    /// One-byte selector used in the signing payload.
    #[must_use]
    pub fn selector(&self) -> u8 {
        match self {
            Self::CreatePosition { .. } => 0x01,
            Self::ReleasePosition { .. } => 0x02,
            Self::ForceRelease { .. } => 0x03,
            Self::SweepExcess => 0x04,
            Self::Raw { .. } => 0xff,
        }
    }

    /// Only position creation may carry value.
    #[must_use]
    pub fn accepts_value(&self) -> bool {
        matches!(self, Self::CreatePosition { .. })
    }

    fn encode_args(&self, out: &mut Vec<u8>) {
        match self {
            Self::CreatePosition {
                beneficiary,
                lock_days,
            } => {
                out.extend_from_slice(beneficiary.as_bytes());
                out.extend_from_slice(&lock_days.to_le_bytes());
            }
            Self::ReleasePosition { beneficiary, index }
            | Self::ForceRelease { beneficiary, index } => {
                out.extend_from_slice(beneficiary.as_bytes());
                out.extend_from_slice(&(*index as u64).to_le_bytes());
            }
            Self::SweepExcess => {}
            Self::Raw { data } => {
                out.extend_from_slice(&(data.len() as u64).to_le_bytes());
                out.extend_from_slice(data);
            }
        }
    }
}

impl std::fmt::Display for VaultCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatePosition { .. } => write!(f, "CREATE_POSITION"),
            Self::ReleasePosition { .. } => write!(f, "RELEASE_POSITION"),
            Self::ForceRelease { .. } => write!(f, "FORCE_RELEASE"),
            Self::SweepExcess => write!(f, "SWEEP_EXCESS"),
            Self::Raw { data } if data.is_empty() => write!(f, "TRANSFER"),
            Self::Raw { .. } => write!(f, "FALLBACK"),
        }
    }
}

/// A call authenticated by the signer's ed25519 key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedCall {
    pub call: VaultCall,
    /// Value attached to the call.
    pub value: Amount,
    /// Per-signer nonce, never reused.
    pub nonce: u64,
    /// Raw ed25519 public key of the signer.
    pub signer: [u8; 32],
    /// Ed25519 signature over [`SignedCall::signing_payload`].
    pub signature: Vec<u8>,
}

impl SignedCall {
    /// Build and sign an envelope.
    #[must_use]
    pub fn sign(key: &SigningKey, call: VaultCall, value: Amount, nonce: u64) -> Self {
        let signer = key.verifying_key().to_bytes();
        let payload = Self::payload(&call, value, nonce, &signer);
        let signature = key.sign(&payload).to_bytes().to_vec();
        Self {
            call,
            value,
            nonce,
            signer,
            signature,
        }
    }

    /// Canonical bytes covered by the signature.
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        Self::payload(&self.call, self.value, self.nonce, &self.signer)
    }

    fn payload(call: &VaultCall, value: Amount, nonce: u64, signer: &[u8; 32]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(128);
        payload.extend_from_slice(constants::CALL_DOMAIN);
        payload.extend_from_slice(signer);
        payload.extend_from_slice(&nonce.to_le_bytes());
        payload.extend_from_slice(&value.to_le_bytes());
        payload.push(call.selector());
        call.encode_args(&mut payload);
        payload
    }

    /// Identity the signer claims, without checking the signature.
    #[must_use]
    pub fn claimed_caller(&self) -> Identity {
        Identity::from_pubkey_bytes(&self.signer)
    }

    /// Verify the signature and return the authenticated caller identity.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidSignature`] if the key or signature is
    /// malformed or the signature does not cover this envelope.
    pub fn verify(&self) -> Result<Identity> {
        let key =
            VerifyingKey::from_bytes(&self.signer).map_err(|_| VaultError::InvalidSignature)?;
        let signature =
            Signature::from_slice(&self.signature).map_err(|_| VaultError::InvalidSignature)?;
        key.verify(&self.signing_payload(), &signature)
            .map_err(|_| VaultError::InvalidSignature)?;
        Ok(Identity::from_public_key(&key))
    }
}

/// Random signing key for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
#[must_use]
pub fn random_signing_key() -> SigningKey {
    SigningKey::from_bytes(&rand::random::<[u8; 32]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_call() -> VaultCall {
        VaultCall::CreatePosition {
            beneficiary: Identity::from_bytes([3u8; 20]),
            lock_days: 365,
        }
    }

    #[test]
    fn signed_call_verifies() {
        let key = random_signing_key();
        let call = SignedCall::sign(&key, create_call(), 1_000, 0);
        let caller = call.verify().unwrap();
        assert_eq!(caller, Identity::from_public_key(&key.verifying_key()));
        assert_eq!(caller, call.claimed_caller());
    }

    #[test]
    fn tampered_value_fails() {
        let key = random_signing_key();
        let mut call = SignedCall::sign(&key, create_call(), 1_000, 0);
        call.value = 1_000_000;
        assert!(matches!(
            call.verify().unwrap_err(),
            VaultError::InvalidSignature
        ));
    }

    #[test]
    fn tampered_call_fails() {
        let key = random_signing_key();
        let mut call = SignedCall::sign(&key, create_call(), 1_000, 0);
        call.call = VaultCall::CreatePosition {
            beneficiary: Identity::from_bytes([4u8; 20]),
            lock_days: 365,
        };
        assert!(call.verify().is_err());
    }

    #[test]
    fn swapped_signer_fails() {
        let key = random_signing_key();
        let other = random_signing_key();
        let mut call = SignedCall::sign(&key, VaultCall::SweepExcess, 0, 9);
        call.signer = other.verifying_key().to_bytes();
        assert!(call.verify().is_err());
    }

    #[test]
    fn truncated_signature_fails() {
        let key = random_signing_key();
        let mut call = SignedCall::sign(&key, VaultCall::SweepExcess, 0, 9);
        call.signature.truncate(10);
        assert!(matches!(
            call.verify().unwrap_err(),
            VaultError::InvalidSignature
        ));
    }

    #[test]
    fn payload_differs_by_nonce() {
        let key = random_signing_key();
        let a = SignedCall::sign(&key, VaultCall::SweepExcess, 0, 1);
        let b = SignedCall::sign(&key, VaultCall::SweepExcess, 0, 2);
        assert_ne!(a.signing_payload(), b.signing_payload());
    }

    #[test]
    fn only_create_accepts_value() {
        assert!(create_call().accepts_value());
        assert!(!VaultCall::SweepExcess.accepts_value());
        assert!(!VaultCall::Raw { data: vec![] }.accepts_value());
    }

    #[test]
    fn raw_display_distinguishes_fallback() {
        assert_eq!(VaultCall::Raw { data: vec![] }.to_string(), "TRANSFER");
        assert_eq!(
            VaultCall::Raw {
                data: vec![0xa1, 0xb2, 0xc3, 0xd4]
            }
            .to_string(),
            "FALLBACK"
        );
    }

    #[test]
    fn serde_roundtrip_keeps_signature_valid() {
        let key = random_signing_key();
        let call = SignedCall::sign(&key, create_call(), 77, 3);
        let json = serde_json::to_string(&call).unwrap();
        let back: SignedCall = serde_json::from_str(&json).unwrap();
        assert!(back.verify().is_ok());
        assert_eq!(back.call, call.call);
    }
}
