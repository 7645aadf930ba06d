//! Client-side request throttle that keeps well under Instagram's limits

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Throttle configuration
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Sliding window length
    pub window: Duration,
    /// Maximum requests per window, keyed by query type
    pub limits: HashMap<String, usize>,
    /// Limit for query types missing from `limits`
    pub fallback_limit: usize,
    /// Multiplier applied to every computed wait
    pub wait_buffer: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        let limits = [("graphql", 120), ("iphone", 120), ("other", 45)]
            .into_iter()
            .map(|(kind, limit)| (kind.to_string(), limit))
            .collect();

        Self {
            window: Duration::from_secs(660), // 11 minutes
            limits,
            fallback_limit: 50,
            wait_buffer: 1.5,
        }
    }
}

/// Per-query-type sliding window of request timestamps
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    config: ThrottleConfig,
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl RequestThrottle {
    /// Create a new throttle
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Requests allowed per window for `query_type`
    pub fn limit_for(&self, query_type: &str) -> usize {
        self.config
            .limits
            .get(query_type)
            .copied()
            .unwrap_or(self.config.fallback_limit)
    }

    /// Wait until a request of `query_type` fits in the window, then record it
    pub async fn acquire(&self, query_type: &str) {
        let limit = self.limit_for(query_type).max(1);

        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let now = Instant::now();
                let window = windows.entry(query_type.to_string()).or_default();

                while window
                    .front()
                    .is_some_and(|sent| now.duration_since(*sent) >= self.config.window)
                {
                    window.pop_front();
                }

                if window.len() < limit {
                    window.push_back(now);
                    debug!(query_type, in_window = window.len(), limit, "Request slot granted");
                    return;
                }

                // Full: wait for the oldest request to leave the window
                let oldest = window.front().copied().unwrap_or(now);
                (oldest + self.config.window)
                    .saturating_duration_since(now)
                    .mul_f64(self.config.wait_buffer)
            };

            info!(
                "Throttling {} queries for {:.1}s ({} per {}s)",
                query_type,
                wait.as_secs_f64(),
                limit,
                self.config.window.as_secs()
            );
            sleep(wait).await;
        }
    }
}
