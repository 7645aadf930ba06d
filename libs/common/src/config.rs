//! Environment-backed settings loading
//!
//! Every service describes its settings as a serde struct with
//! `#[serde(default)]`, and this module fills it from the process
//! environment. A variable named `<PREFIX>_<FIELD>` overrides the field
//! called `<field>`; anything unset keeps its default.

use config::{Config, Environment};
use serde::de::DeserializeOwned;

use crate::error::{ConfigurationError, ConfigurationResult};

/// Load settings of type `T` from environment variables starting with `prefix`
///
/// # Arguments
///
/// * `prefix` - Variable prefix without the trailing underscore (e.g. "GIVEAWAY")
pub fn load_env<T: DeserializeOwned>(prefix: &str) -> ConfigurationResult<T> {
    let settings = Config::builder()
        .add_source(Environment::with_prefix(prefix).try_parsing(true))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Reject a zero value for a setting that must be positive
pub fn require_positive(key: &str, value: u64) -> ConfigurationResult<u64> {
    if value == 0 {
        return Err(ConfigurationError::InvalidValue {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
