//! Giveaway service configuration

use common::config::{load_env, require_positive};
use common::error::ConfigurationResult;
use serde::Deserialize;
use std::time::Duration;

use crate::retriever::FetchSettings;

/// Giveaway service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GiveawayConfig {
    /// Session lifetime in seconds (default: 30 minutes)
    pub session_ttl_secs: u64,
    /// Seconds between expired-session sweeps (default: 5 minutes)
    pub cleanup_interval_secs: u64,
    /// Comments requested per page
    pub page_size: u32,
    /// Base pause between pages in milliseconds
    pub pagination_delay_ms: u64,
    /// Comments fetched before pacing starts to grow
    pub progressive_threshold: usize,
    /// Pacing growth per additional block of comments
    pub progressive_factor: f64,
    /// Comment iterations attempted on transient errors
    pub max_attempts: u32,
    /// First retry backoff in milliseconds
    pub retry_backoff_ms: u64,
}

impl Default for GiveawayConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            session_ttl_secs: 1800,
            cleanup_interval_secs: 300,
            page_size: fetch.page_size,
            pagination_delay_ms: fetch.pagination_delay.as_millis() as u64,
            progressive_threshold: fetch.progressive_threshold,
            progressive_factor: fetch.progressive_factor,
            max_attempts: fetch.max_attempts,
            retry_backoff_ms: fetch.retry_backoff.as_millis() as u64,
        }
    }
}

impl GiveawayConfig {
    /// Create a new GiveawayConfig from environment variables
    ///
    /// # Environment Variables
    /// - `GIVEAWAY_SESSION_TTL_SECS` (default: 1800)
    /// - `GIVEAWAY_CLEANUP_INTERVAL_SECS` (default: 300)
    /// - `GIVEAWAY_PAGE_SIZE` (default: 12)
    /// - `GIVEAWAY_PAGINATION_DELAY_MS` (default: 1000)
    /// - `GIVEAWAY_PROGRESSIVE_THRESHOLD` (default: 50)
    /// - `GIVEAWAY_PROGRESSIVE_FACTOR` (default: 1.2)
    /// - `GIVEAWAY_MAX_ATTEMPTS` (default: 3)
    /// - `GIVEAWAY_RETRY_BACKOFF_MS` (default: 5000)
    pub fn from_env() -> ConfigurationResult<Self> {
        let config: GiveawayConfig = load_env("GIVEAWAY")?;
        require_positive("GIVEAWAY_SESSION_TTL_SECS", config.session_ttl_secs)?;
        require_positive("GIVEAWAY_CLEANUP_INTERVAL_SECS", config.cleanup_interval_secs)?;
        require_positive("GIVEAWAY_PAGE_SIZE", u64::from(config.page_size))?;
        require_positive("GIVEAWAY_MAX_ATTEMPTS", u64::from(config.max_attempts))?;
        Ok(config)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            page_size: self.page_size,
            pagination_delay: Duration::from_millis(self.pagination_delay_ms),
            progressive_threshold: self.progressive_threshold,
            progressive_factor: self.progressive_factor,
            max_attempts: self.max_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}
