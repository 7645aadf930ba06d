//! Periodic sweep of expired sessions

use anyhow::Result;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};

use crate::session::SessionStore;

/// Default interval between expired-session sweeps
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Background job sweeping expired sessions for the life of the process
pub struct SessionJanitor {
    scheduler: JobScheduler,
    interval: Duration,
}

impl SessionJanitor {
    pub async fn start(store: SessionStore, interval: Duration) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        let job = Job::new_repeated_async(interval, move |_, _| {
            let store = store.clone();
            Box::pin(async move {
                let removed = store.cleanup_expired().await;
                debug!(removed, "Session cleanup job executed");
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!(
            "Started periodic session cleanup task (interval={}s)",
            interval.as_secs()
        );
        Ok(Self {
            scheduler,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        info!("Stopped periodic session cleanup task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use instagram::{CommentPage, Connector, InstagramApi, Post};
    use std::sync::Arc;

    struct AnyAccount;

    #[async_trait]
    impl InstagramApi for AnyAccount {
        async fn post_by_shortcode(&self, shortcode: &str) -> instagram::Result<Post> {
            Ok(Post {
                shortcode: shortcode.to_string(),
                owner_username: None,
                comment_count: None,
            })
        }

        async fn comments_page(
            &self,
            _shortcode: &str,
            _page_size: u32,
            _after: Option<&str>,
        ) -> instagram::Result<CommentPage> {
            Ok(CommentPage::default())
        }

        async fn current_username(&self) -> instagram::Result<Option<String>> {
            Ok(Some("host".to_string()))
        }
    }

    impl Connector for AnyAccount {
        fn connect(&self, _session_cookie: &str) -> instagram::Result<Arc<dyn InstagramApi>> {
            Ok(Arc::new(AnyAccount))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sweeps_expired_sessions_until_shutdown() -> Result<()> {
        // Sessions expire almost immediately so the first sweep removes them
        let store = SessionStore::new(Arc::new(AnyAccount), Duration::from_millis(10));
        store.login("cookie").await?;
        store.login("cookie").await?;

        let janitor = SessionJanitor::start(store.clone(), Duration::from_secs(1)).await?;
        assert_eq!(janitor.interval(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(store.is_empty().await);

        janitor.shutdown().await?;
        Ok(())
    }
}
