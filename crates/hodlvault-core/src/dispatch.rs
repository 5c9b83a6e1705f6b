//! Signed-call dispatch.
//!
//! A [`SignedCall`] is authenticated (ed25519), checked against the
//! signer's used nonces, and then routed to the matching vault entry point.
//! Value attached to anything other than `CreatePosition` never reaches an
//! entry point: the inbound guard rejects it.
//!
//! The value a `CreatePosition` call attaches is collected from the
//! signer's bank balance before the vault sees it, and refunded if the
//! vault rejects the call.
//!
//! A nonce is consumed as soon as the signature verifies, even if the call
//! itself then fails. Resubmitting a failed call needs a fresh nonce.

use std::collections::{HashMap, HashSet};

use hodlvault_types::{Amount, Identity, Result, SignedCall, VaultCall, VaultConfig, VaultError};

use crate::{
    bank::Bank,
    clock::Clock,
    vault::{CallContext, HodlVault},
};

/// Per-signer nonce replay protection with a bounded quota.
#[derive(Debug, Clone)]
pub struct NonceTracker {
    used: HashMap<Identity, HashSet<u64>>,
    max_per_signer: usize,
}

impl NonceTracker {
    #[must_use]
    pub fn new(max_per_signer: usize) -> Self {
        Self {
            used: HashMap::new(),
            max_per_signer,
        }
    }

    /// Record `nonce` for `signer`.
    ///
    /// # Errors
    /// - `NonceReplay` if the nonce was already used by this signer
    /// - `NonceQuotaExceeded` if the signer has used up its quota
    pub fn check_and_record(&mut self, signer: Identity, nonce: u64) -> Result<()> {
        let nonces = self.used.entry(signer).or_default();

        if nonces.contains(&nonce) {
            return Err(VaultError::NonceReplay { signer, nonce });
        }
        if nonces.len() >= self.max_per_signer {
            return Err(VaultError::NonceQuotaExceeded {
                signer,
                limit: self.max_per_signer,
            });
        }

        nonces.insert(nonce);
        Ok(())
    }

    #[must_use]
    pub fn is_used(&self, signer: &Identity, nonce: u64) -> bool {
        self.used.get(signer).is_some_and(|n| n.contains(&nonce))
    }

    pub fn clear_signer(&mut self, signer: &Identity) {
        self.used.remove(signer);
    }

    /// Total nonces tracked across all signers.
    #[must_use]
    pub fn total_nonces(&self) -> usize {
        self.used.values().map(HashSet::len).sum()
    }
}

/// What a successfully dispatched call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    PositionCreated { index: usize },
    Released { amount: Amount },
    Liquidated { amount: Amount },
    Swept { amount: Amount },
}

/// Authenticates signed calls and routes them into a vault.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    nonces: NonceTracker,
}

impl Dispatcher {
    #[must_use]
    pub fn new(max_nonces_per_signer: usize) -> Self {
        Self {
            nonces: NonceTracker::new(max_nonces_per_signer),
        }
    }

    #[must_use]
    pub fn from_config(config: &VaultConfig) -> Self {
        Self::new(config.max_nonces_per_signer)
    }

    #[must_use]
    pub fn nonces(&self) -> &NonceTracker {
        &self.nonces
    }

    /// Verify `signed` and execute it against `vault`.
    ///
    /// # Errors
    /// - `InvalidSignature` if the envelope does not verify
    /// - `InsufficientFunds` if the signer cannot fund the attached value
    /// - `NonceReplay` / `NonceQuotaExceeded` from the nonce check
    /// - `DirectTransferRejected` for value on a non-create call or a `Raw` call
    /// - any error of the targeted vault operation
    pub fn dispatch<C: Clock, B: Bank>(
        &mut self,
        vault: &mut HodlVault<C, B>,
        signed: &SignedCall,
    ) -> Result<CallOutcome> {
        let caller = signed.verify().inspect_err(|_| {
            tracing::warn!(
                claimed = %signed.claimed_caller(),
                call = %signed.call,
                "Rejected call with invalid signature"
            );
        })?;
        self.nonces.check_and_record(caller, signed.nonce)?;

        let ctx = CallContext::new(caller, signed.value);
        tracing::debug!(
            caller = %caller,
            call = %signed.call,
            value = %signed.value,
            nonce = signed.nonce,
            "Dispatching call"
        );

        if signed.value > 0 && !signed.call.accepts_value() {
            let never = vault.receive(&ctx, &[signed.call.selector()])?;
            match never {}
        }

        match &signed.call {
            VaultCall::CreatePosition {
                beneficiary,
                lock_days,
            } => {
                if signed.value > 0 {
                    Self::collect_attached(vault, caller, signed.value)?;
                }
                match vault.create_position(&ctx, *beneficiary, *lock_days) {
                    Ok(index) => Ok(CallOutcome::PositionCreated { index }),
                    Err(err) => {
                        if signed.value > 0 {
                            vault.bank_mut().refund(caller, signed.value);
                        }
                        Err(err)
                    }
                }
            }
            VaultCall::ReleasePosition { beneficiary, index } => vault
                .release_position(&ctx, *beneficiary, *index)
                .map(|amount| CallOutcome::Released { amount }),
            VaultCall::ForceRelease { beneficiary, index } => vault
                .force_release(&ctx, *beneficiary, *index)
                .map(|amount| CallOutcome::Liquidated { amount }),
            VaultCall::SweepExcess => vault
                .sweep_excess(&ctx)
                .map(|amount| CallOutcome::Swept { amount }),
            VaultCall::Raw { data } => {
                let never = vault.receive(&ctx, data)?;
                match never {}
            }
        }
    }

    fn collect_attached<C: Clock, B: Bank>(
        vault: &mut HodlVault<C, B>,
        payer: Identity,
        amount: Amount,
    ) -> Result<()> {
        vault.bank_mut().collect(payer, amount).map_err(|rejected| {
            tracing::warn!(
                payer = %payer,
                amount = %amount,
                reason = %rejected,
                "Attached value could not be collected"
            );
            VaultError::InsufficientFunds {
                payer,
                amount,
                reason: rejected.reason,
            }
        })
    }
}
