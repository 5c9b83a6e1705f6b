//! # hodlvault-types
//!
//! Shared types, errors, and configuration for the **HodlVault** time-locked
//! custody ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Identity`], [`Amount`], [`Timestamp`]
//! - **Position model**: [`Position`]
//! - **Events**: [`VaultEvent`]
//! - **Call envelopes**: [`VaultCall`], [`SignedCall`]
//! - **Configuration**: [`VaultConfig`], [`LiquidationPolicy`]
//! - **Errors**: [`VaultError`] with `HV_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod call;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod position;

// Re-export all primary types at crate root for ergonomic imports:
//   use hodlvault_types::{Identity, Position, VaultError, ...};

pub use call::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use position::*;

// Constants are accessed via `hodlvault_types::constants::FOO`
// (not re-exported to avoid name collisions).
