//! Structured logging setup.
//!
//! Installs a `tracing` subscriber with `RUST_LOG`-driven filtering and
//! pretty or JSON output. Library code only emits events; hosts call
//! [`init_tracing`] once at startup.

use hodlvault_types::{Result, VaultError, constants};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for local runs.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// `"json"` (any case) selects JSON; anything else is `Pretty`.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Install the global subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset, e.g.
/// `"hodlvault_core=debug,hodlvault_ledger=info"`.
///
/// # Errors
/// Returns `Configuration` if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true))
            .try_init(),
    };
    installed.map_err(|e| VaultError::Configuration(format!("tracing init failed: {e}")))?;

    tracing::info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        ?format,
        "Tracing initialized"
    );
    Ok(())
}
