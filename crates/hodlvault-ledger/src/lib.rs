//! # hodlvault-ledger
//!
//! **Ledger plane**: the state stores behind the vault.
//!
//! ## Architecture
//!
//! 1. **PositionLedger**: beneficiary → position slots, plus the locked total
//! 2. **Custody**: the vault's raw balance, an upper bound only
//! 3. **SolvencyTracker**: value-flow bookkeeping; verifies
//!    `custody == expected` and `custody >= locked_total`
//! 4. **EventLog**: bounded, hash-chained record of emitted events
//! 5. **VaultSnapshot**: durable form of the above
//!
//! Nothing in this crate moves value to the outside world or checks who is
//! calling; that is `hodlvault-core`'s job.

pub mod custody;
pub mod event_log;
pub mod position_ledger;
pub mod snapshot;
pub mod solvency;

pub use custody::Custody;
pub use event_log::{EventLog, EventRecord};
pub use position_ledger::{ClosedPosition, PositionLedger};
pub use snapshot::{BeneficiaryEntry, VaultSnapshot};
pub use solvency::SolvencyTracker;
