//! System-wide constants for the HodlVault ledger.

/// Seconds in one lock day. Lock durations are expressed in whole days.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Length of an [`Identity`](crate::Identity) in bytes.
pub const IDENTITY_LEN: usize = 20;

/// Default number of events retained by the event log before the oldest
/// entries are evicted.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100_000;

/// Maximum nonce entries to retain per signer before rejecting new calls.
pub const MAX_NONCE_ENTRIES_PER_SIGNER: usize = 100_000;

/// Domain separator for signed call payloads.
pub const CALL_DOMAIN: &[u8] = b"hodlvault:call:v1:";

/// Domain separator for the event log digest chain.
pub const EVENT_DOMAIN: &[u8] = b"hodlvault:event:v1:";

/// Domain separator used when deriving an identity from a public key.
pub const IDENTITY_DOMAIN: &[u8] = b"hodlvault:identity:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "HodlVault";
