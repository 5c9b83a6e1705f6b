//! # hodlvault-core
//!
//! The **HodlVault** time-locked custody vault.
//!
//! - [`HodlVault`]: position lifecycle, operator override, balance sweep and
//!   the inbound-value guard
//! - [`Role`]: per-operation access check
//! - [`Clock`]: time source ([`SystemClock`], [`ManualClock`])
//! - [`Bank`]: outbound value transfers ([`InMemoryBank`])
//! - [`Dispatcher`]: authenticates [`SignedCall`](hodlvault_types::SignedCall)s
//!   and routes them into the vault
//! - [`telemetry`]: `tracing` subscriber setup
//!
//! ## Solvency
//!
//! The vault keeps two numbers apart: the custodied balance (everything it
//! holds) and the locked total (everything it owes). Every operation keeps
//! `custodied_balance >= locked_total`, and only the difference can be swept.
//!
//! ```text
//!   create ──▶ ACTIVE ──(now >= release_time, beneficiary)──▶ withdrawn
//!                 │
//!                 └──────────(operator, any time)────────────▶ liquidated
//! ```

pub mod access;
pub mod bank;
pub mod clock;
pub mod dispatch;
pub mod telemetry;
pub mod vault;

pub use access::Role;
pub use bank::{Bank, InMemoryBank, TransferRejected};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{CallOutcome, Dispatcher, NonceTracker};
pub use telemetry::{LogFormat, init_tracing};
pub use vault::{CallContext, HodlVault};
