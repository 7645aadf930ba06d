//! Logging setup shared by the binaries

use tracing_subscriber::EnvFilter;

use crate::error::{ConfigurationError, ConfigurationResult};

/// Install the global fmt subscriber
///
/// The filter comes from `RUST_LOG` and falls back to `info` when the
/// variable is missing or unparsable.
pub fn init_tracing() -> ConfigurationResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| ConfigurationError::Telemetry(e.to_string()))
}
