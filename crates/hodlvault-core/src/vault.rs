//! The vault: position lifecycle, operator override and balance sweep.
//!
//! Every state-changing operation runs the same sequence:
//!
//! ```text
//! authorize → validate → mutate ledger → mutate custody → verify solvency
//!           → outbound transfer → append event
//! ```
//!
//! Ledger and custody are fully updated before any value leaves. If any
//! later step fails (most importantly a recipient refusing the transfer)
//! the ledger, custody and solvency bookkeeping are put back exactly as they
//! were and the error is returned. Events are appended only after
//! everything else has succeeded.

use std::convert::Infallible;

use hodlvault_ledger::{
    ClosedPosition, Custody, EventLog, PositionLedger, SolvencyTracker, VaultSnapshot,
};
use hodlvault_types::{
    Amount, Identity, InboundKind, LiquidationPolicy, Position, Result, Timestamp, VaultConfig,
    VaultError, VaultEvent,
};

use crate::{access::Role, bank::Bank, clock::Clock};

/// Who is calling and how much value they attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Identity,
    pub value: Amount,
}

impl CallContext {
    #[must_use]
    pub fn new(caller: Identity, value: Amount) -> Self {
        Self { caller, value }
    }

    /// A call with no value attached.
    #[must_use]
    pub fn valueless(caller: Identity) -> Self {
        Self { caller, value: 0 }
    }
}

/// Why value is leaving custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outflow {
    Withdrawal,
    Liquidation,
    Sweep,
}

/// Time-locked custodial vault.
pub struct HodlVault<C: Clock, B: Bank> {
    /// Privileged identity, fixed at construction.
    operator: Identity,
    config: VaultConfig,
    ledger: PositionLedger,
    custody: Custody,
    solvency: SolvencyTracker,
    events: EventLog,
    clock: C,
    bank: B,
}

impl<C: Clock, B: Bank> HodlVault<C, B> {
    /// Create an empty vault administered by `operator`.
    ///
    /// # Errors
    /// Returns `Configuration` if the operator is the null identity or the
    /// config fails validation.
    pub fn new(operator: Identity, config: VaultConfig, clock: C, bank: B) -> Result<Self> {
        config.validate()?;
        if operator.is_null() {
            return Err(VaultError::Configuration(
                "operator cannot be the null identity".into(),
            ));
        }
        tracing::info!(
            operator = %operator,
            liquidation_policy = %config.liquidation_policy,
            "Vault initialized"
        );
        Ok(Self {
            operator,
            events: EventLog::new(config.event_log_capacity),
            config,
            ledger: PositionLedger::new(),
            custody: Custody::new(),
            solvency: SolvencyTracker::new(),
            clock,
            bank,
        })
    }

    /// Rebuild a vault from a persisted snapshot.
    ///
    /// The event log starts empty; the solvency tracker resumes from the
    /// snapshot's custodied balance.
    ///
    /// # Errors
    /// Returns `InvalidSnapshot` if the snapshot is inconsistent, or
    /// `Configuration` if the config fails validation.
    pub fn restore(snapshot: &VaultSnapshot, config: VaultConfig, clock: C, bank: B) -> Result<Self> {
        config.validate()?;
        let ledger = snapshot.to_ledger()?;
        tracing::info!(
            operator = %snapshot.operator,
            custodied = %snapshot.custodied_balance,
            locked_total = %snapshot.locked_total,
            beneficiaries = ledger.beneficiary_count(),
            "Vault restored from snapshot"
        );
        Ok(Self {
            operator: snapshot.operator,
            events: EventLog::new(config.event_log_capacity),
            config,
            ledger,
            custody: Custody::with_balance(snapshot.custodied_balance),
            solvency: SolvencyTracker::resume(snapshot.custodied_balance),
            clock,
            bank,
        })
    }

    /// Capture the durable state.
    #[must_use]
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot::capture(self.operator, &self.ledger, self.custody.balance())
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn operator(&self) -> Identity {
        self.operator
    }

    #[must_use]
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// All positions of `beneficiary`, in creation order.
    #[must_use]
    pub fn positions_of(&self, beneficiary: &Identity) -> &[Position] {
        self.ledger.positions_of(beneficiary)
    }

    /// Sum of all active positions: what the vault owes.
    #[must_use]
    pub fn locked_total(&self) -> Amount {
        self.ledger.locked_total()
    }

    /// Raw balance held by the vault.
    #[must_use]
    pub fn custodied_balance(&self) -> Amount {
        self.custody.balance()
    }

    /// Value a sweep would move right now.
    #[must_use]
    pub fn excess(&self) -> Amount {
        self.custody
            .balance()
            .saturating_sub(self.ledger.locked_total())
    }

    #[must_use]
    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    #[must_use]
    pub fn solvency(&self) -> &SolvencyTracker {
        &self.solvency
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    // ---------------------------------------------------------------------
    // Lifecycle operations
    // ---------------------------------------------------------------------

    /// Lock the attached value for `beneficiary` for `lock_days` days.
    ///
    /// Returns the index of the new slot in the beneficiary's entry.
    ///
    /// # Errors
    /// - `InvalidAmount` if no value is attached
    /// - `InvalidBeneficiary` if `beneficiary` is the null identity
    /// - `PositionAlreadyActive` if the beneficiary has an active position
    /// - `LockDurationOverflow` if the release time is out of range
    pub fn create_position(
        &mut self,
        ctx: &CallContext,
        beneficiary: Identity,
        lock_days: u64,
    ) -> Result<usize> {
        if ctx.value == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if beneficiary.is_null() {
            return Err(VaultError::InvalidBeneficiary);
        }
        let now = self.clock.now();
        let release_time = self.release_time_for(now, lock_days)?;

        let index = self.ledger.open(beneficiary, ctx.value, release_time)?;

        let saved_custody = self.custody;
        let saved_solvency = self.solvency.clone();
        if let Err(err) = self.try_accept(ctx.value) {
            self.custody = saved_custody;
            self.solvency = saved_solvency;
            self.ledger.revert_open(&beneficiary, index)?;
            return Err(err);
        }

        self.events.append(
            VaultEvent::PositionCreated {
                beneficiary,
                amount: ctx.value,
                release_time,
            },
            now,
        );
        tracing::info!(
            depositor = %ctx.caller,
            beneficiary = %beneficiary,
            amount = %ctx.value,
            release_time,
            index,
            "Position created"
        );
        Ok(index)
    }

    /// Beneficiary withdraws a matured position. Returns the amount paid.
    ///
    /// An already inactive slot is a successful no-op that pays zero.
    ///
    /// # Errors
    /// - `DirectTransferRejected` if value is attached
    /// - `NotBeneficiary` if the caller is not `beneficiary`
    /// - `PositionNotFound` if `index` is out of range
    /// - `NotMatured` if the release time has not been reached
    /// - `TransferFailed` if the beneficiary refuses the payout
    pub fn release_position(
        &mut self,
        ctx: &CallContext,
        beneficiary: Identity,
        index: usize,
    ) -> Result<Amount> {
        Self::reject_attached_value(ctx)?;
        Role::Beneficiary(beneficiary).authorize(ctx.caller, self.operator)?;

        let now = self.clock.now();
        let position = *self.ledger.get(&beneficiary, index)?;
        if !position.is_matured(now) {
            return Err(VaultError::NotMatured {
                release_time: position.release_time,
                now,
            });
        }

        let closed = self.ledger.close(&beneficiary, index)?;
        if closed.amount == 0 {
            tracing::warn!(
                beneficiary = %beneficiary,
                index,
                "Release of inactive position: nothing to pay"
            );
        }
        self.pay_out(closed.amount, Some(&closed), beneficiary, Outflow::Withdrawal)?;

        self.events.append(
            VaultEvent::PositionWithdrawn {
                beneficiary,
                amount: closed.amount,
                withdrawn_at: now,
            },
            now,
        );
        tracing::info!(
            beneficiary = %beneficiary,
            amount = %closed.amount,
            index,
            "Position withdrawn"
        );
        Ok(closed.amount)
    }

    /// Operator override: release a position regardless of maturity.
    ///
    /// The value goes to the beneficiary or the operator according to
    /// [`VaultConfig::liquidation_policy`]. Returns the amount paid.
    ///
    /// # Errors
    /// - `DirectTransferRejected` if value is attached
    /// - `NotOperator` if the caller is not the operator
    /// - `PositionNotFound` if `index` is out of range
    /// - `TransferFailed` if the recipient refuses the payout
    pub fn force_release(
        &mut self,
        ctx: &CallContext,
        beneficiary: Identity,
        index: usize,
    ) -> Result<Amount> {
        Self::reject_attached_value(ctx)?;
        Role::Operator.authorize(ctx.caller, self.operator)?;

        let now = self.clock.now();
        let recipient = match self.config.liquidation_policy {
            LiquidationPolicy::ReturnToBeneficiary => beneficiary,
            LiquidationPolicy::Operator => self.operator,
        };

        let closed = self.ledger.close(&beneficiary, index)?;
        self.pay_out(closed.amount, Some(&closed), recipient, Outflow::Liquidation)?;

        self.events.append(
            VaultEvent::PositionLiquidated {
                beneficiary,
                amount: closed.amount,
                recipient,
                liquidated_at: now,
            },
            now,
        );
        tracing::info!(
            beneficiary = %beneficiary,
            recipient = %recipient,
            amount = %closed.amount,
            index,
            remaining_lock = closed.release_time.saturating_sub(now),
            "Position liquidated by operator"
        );
        Ok(closed.amount)
    }

    /// Operator reclaims value that backs no position. Returns the amount
    /// swept; zero excess is a successful no-op.
    ///
    /// # Errors
    /// - `DirectTransferRejected` if value is attached
    /// - `NotOperator` if the caller is not the operator
    /// - `TransferFailed` if the operator refuses the payout
    pub fn sweep_excess(&mut self, ctx: &CallContext) -> Result<Amount> {
        Self::reject_attached_value(ctx)?;
        Role::Operator.authorize(ctx.caller, self.operator)?;

        // Never the raw balance: only what exceeds the obligations.
        let excess = SolvencyTracker::excess(self.custody.balance(), self.ledger.locked_total())?;
        if excess == 0 {
            tracing::debug!(
                custodied = %self.custody.balance(),
                locked_total = %self.ledger.locked_total(),
                "Sweep: no excess"
            );
            return Ok(0);
        }

        let operator = self.operator;
        self.pay_out(excess, None, operator, Outflow::Sweep)?;
        tracing::info!(
            operator = %operator,
            amount = %excess,
            locked_total = %self.ledger.locked_total(),
            "Excess swept"
        );
        Ok(excess)
    }

    /// Value arriving outside of [`create_position`](Self::create_position):
    /// a bare transfer (empty `data`) or a call matching no entry point.
    /// Always rejected.
    ///
    /// # Errors
    /// Always returns `DirectTransferRejected`.
    pub fn receive(&self, ctx: &CallContext, data: &[u8]) -> Result<Infallible> {
        let kind = if data.is_empty() {
            InboundKind::Bare
        } else {
            InboundKind::UnknownCall
        };
        tracing::warn!(
            sender = %ctx.caller,
            value = %ctx.value,
            data_len = data.len(),
            "Direct transfer rejected"
        );
        Err(VaultError::DirectTransferRejected { kind })
    }

    /// Account for value that reached the vault without passing any guard
    /// (a forced transfer). It backs no position and becomes sweepable.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if the custody balance would overflow.
    pub fn absorb_forced_transfer(&mut self, amount: Amount) -> Result<()> {
        let mut solvency = self.solvency.clone();
        solvency.record_injection(amount)?;
        self.custody.credit(amount)?;
        self.solvency = solvency;
        tracing::warn!(
            amount = %amount,
            custodied = %self.custody.balance(),
            locked_total = %self.ledger.locked_total(),
            "Forced transfer absorbed into custody"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// `now + lock_days × seconds_per_day`, overflow-checked and capped by
    /// `max_lock_days`.
    fn release_time_for(&self, now: Timestamp, lock_days: u64) -> Result<Timestamp> {
        if self
            .config
            .max_lock_days
            .is_some_and(|max| lock_days > max)
        {
            return Err(VaultError::LockDurationOverflow { days: lock_days });
        }
        lock_days
            .checked_mul(self.config.seconds_per_day)
            .and_then(|secs| now.checked_add(secs))
            .ok_or(VaultError::LockDurationOverflow { days: lock_days })
    }

    fn reject_attached_value(ctx: &CallContext) -> Result<()> {
        if ctx.value > 0 {
            return Err(VaultError::DirectTransferRejected {
                kind: InboundKind::UnknownCall,
            });
        }
        Ok(())
    }

    fn try_accept(&mut self, amount: Amount) -> Result<()> {
        self.custody.credit(amount)?;
        self.solvency.record_deposit(amount)?;
        self.solvency
            .verify(self.custody.balance(), self.ledger.locked_total())
    }

    /// Move `amount` out of custody to `recipient`. On any failure, restore
    /// custody, the solvency bookkeeping and (if given) the closed position.
    fn pay_out(
        &mut self,
        amount: Amount,
        closed: Option<&ClosedPosition>,
        recipient: Identity,
        flow: Outflow,
    ) -> Result<()> {
        let saved_custody = self.custody;
        let saved_solvency = self.solvency.clone();
        if let Err(err) = self.try_pay_out(amount, recipient, flow) {
            self.custody = saved_custody;
            self.solvency = saved_solvency;
            if let Some(c) = closed {
                self.ledger.revert_close(c)?;
            }
            return Err(err);
        }
        Ok(())
    }

    fn try_pay_out(&mut self, amount: Amount, recipient: Identity, flow: Outflow) -> Result<()> {
        self.custody.debit(amount)?;
        match flow {
            Outflow::Withdrawal => self.solvency.record_withdrawal(amount),
            Outflow::Liquidation => self.solvency.record_liquidation(amount),
            Outflow::Sweep => self.solvency.record_sweep(amount),
        }?;
        self.solvency
            .verify(self.custody.balance(), self.ledger.locked_total())?;

        if amount == 0 {
            return Ok(());
        }
        self.bank.transfer(recipient, amount).map_err(|rejected| {
            tracing::warn!(
                recipient = %recipient,
                amount = %amount,
                reason = %rejected,
                "Outbound transfer rejected; reverting"
            );
            VaultError::TransferFailed {
                recipient,
                amount,
                reason: rejected.reason,
            }
        })
    }
}
