//! Tracing subscriber setup.

use crate::config::LogFormat;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Audit records are emitted under the `audit`
/// target, so `RUST_LOG=audit=off` silences them without touching the rest.
///
/// # Errors
///
/// Returns an error if `default_level` is not a valid filter directive or a global subscriber
/// is already installed.
pub fn init_tracing(default_level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(default_level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Text => registry.with(fmt::layer().compact()).try_init()?,
    }
    Ok(())
}
