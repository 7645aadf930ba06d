//! Common library for the Givegram application
//!
//! This crate provides shared functionality used across the crates of the
//! Givegram workspace: environment-driven settings, error types for
//! start-up plumbing, and logging initialisation.

pub mod config;
pub mod error;
pub mod telemetry;

/// Example usage of the settings loader
///
/// ```rust,no_run
/// use common::config::load_env;
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// #[serde(default)]
/// struct Settings {
///     page_size: u32,
/// }
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     common::telemetry::init_tracing()?;
///     let settings: Settings = load_env("GIVEAWAY")?;
///     println!("Page size: {}", settings.page_size);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
