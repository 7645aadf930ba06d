use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use common::config::load_env;
use giveaway::{
    CommentRetriever, CommentSummary, GiveawayConfig, GiveawayError, GiveawayService, LoginRequest,
    PickWinnersRequest, SessionJanitor, SessionStore,
};
use instagram::{ClientConfig, InstagramConnector};

/// One giveaway run, read from `GIVEAWAY_*` variables
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RunConfig {
    session_cookie: Option<String>,
    post_url: Option<String>,
    num_winners: usize,
    min_comments: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            session_cookie: None,
            post_url: None,
            num_winners: 1,
            min_comments: 1,
        }
    }
}

#[derive(Serialize)]
struct RunReport {
    account: String,
    post_url: String,
    summary: CommentSummary,
    winners: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    common::telemetry::init_tracing()?;

    info!("Starting giveaway picker");

    let config = GiveawayConfig::from_env()?;
    let run: RunConfig = load_env("GIVEAWAY")?;
    let client_config = ClientConfig::from_env()?;

    let connector = Arc::new(InstagramConnector::new(client_config));
    let sessions = SessionStore::new(connector, config.session_ttl());
    let janitor = SessionJanitor::start(sessions.clone(), config.cleanup_interval()).await?;

    let service = GiveawayService::new(sessions, CommentRetriever::new(config.fetch_settings()));

    let outcome = run_giveaway(&service, run).await;
    if let Err(e) = &outcome {
        let retryable = e
            .downcast_ref::<GiveawayError>()
            .is_some_and(GiveawayError::is_retryable);
        error!(retryable, "Giveaway run failed: {:#}", e);
        if retryable {
            info!("Instagram may recover shortly; run the giveaway again in a few minutes");
        }
    }

    janitor.shutdown().await?;
    info!("Shutting down giveaway picker");

    outcome
}

async fn run_giveaway(service: &GiveawayService, run: RunConfig) -> Result<()> {
    let session_cookie = run
        .session_cookie
        .context("GIVEAWAY_SESSION_COOKIE must be set to a 'sessionid' cookie value")?;
    let post_url = run
        .post_url
        .context("GIVEAWAY_POST_URL must be set to the post to draw from")?;

    let login = service.login(&LoginRequest { session_cookie }).await?;

    // Fetching can take minutes; keep it on its own task
    let fetch = tokio::spawn({
        let service = service.clone();
        let session_id = login.session_id.clone();
        let post_url = post_url.clone();
        async move { service.fetch_comments(&session_id, &post_url).await }
    });

    let result = match fetch.await.context("comment fetch task panicked") {
        Ok(Ok(summary)) => {
            let request = PickWinnersRequest {
                users: summary.users.clone(),
                num_winners: run.num_winners,
                min_comments: run.min_comments,
            };
            service
                .pick_winners(&request)
                .map(|response| RunReport {
                    account: login.username.clone(),
                    post_url,
                    summary,
                    winners: response.winners,
                })
                .map_err(anyhow::Error::from)
        }
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(e),
    };

    service.logout(&login.session_id).await;

    let report = result?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use instagram::{Comment, CommentPage, Connector, InstagramApi, InstagramError, Post};
    use std::time::Duration;

    /// Post with two commenters; `crash` makes the comment walk panic
    struct OnePost {
        crash: bool,
    }

    #[async_trait]
    impl InstagramApi for OnePost {
        async fn post_by_shortcode(&self, shortcode: &str) -> instagram::Result<Post> {
            Ok(Post {
                shortcode: shortcode.to_string(),
                owner_username: Some("host".to_string()),
                comment_count: Some(2),
            })
        }

        async fn comments_page(
            &self,
            _shortcode: &str,
            _page_size: u32,
            _after: Option<&str>,
        ) -> instagram::Result<CommentPage> {
            if self.crash {
                panic!("comment walk blew up");
            }
            let comment = |id: &str, author: &str| Comment {
                id: id.to_string(),
                owner_username: author.to_string(),
                text: "count me in".to_string(),
                created_at: DateTime::from_timestamp(1, 0).unwrap(),
            };
            Ok(CommentPage {
                comments: vec![comment("1", "alice"), comment("2", "bob")],
                next_cursor: None,
            })
        }

        async fn current_username(&self) -> instagram::Result<Option<String>> {
            Ok(Some("host".to_string()))
        }
    }

    struct OnePostConnector {
        crash: bool,
    }

    impl Connector for OnePostConnector {
        fn connect(&self, _session_cookie: &str) -> instagram::Result<Arc<dyn InstagramApi>> {
            Ok(Arc::new(OnePost { crash: self.crash }))
        }
    }

    fn setup(crash: bool) -> (SessionStore, GiveawayService) {
        let sessions = SessionStore::new(
            Arc::new(OnePostConnector { crash }),
            Duration::from_secs(30 * 60),
        );
        let service = GiveawayService::new(sessions.clone(), CommentRetriever::default());
        (sessions, service)
    }

    fn run_config() -> RunConfig {
        RunConfig {
            session_cookie: Some("cookie".to_string()),
            post_url: Some("https://www.instagram.com/p/ABC123/".to_string()),
            num_winners: 2,
            min_comments: 1,
        }
    }

    #[tokio::test]
    async fn test_run_logs_out_after_success() {
        let (sessions, service) = setup(false);

        run_giveaway(&service, run_config()).await.unwrap();

        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_run_logs_out_when_fetch_task_panics() {
        let (sessions, service) = setup(true);

        let err = run_giveaway(&service, run_config()).await.unwrap_err();

        assert!(err.to_string().contains("panicked"), "{err:#}");
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_cookie_is_reported() {
        let (_, service) = setup(false);
        let run = RunConfig {
            session_cookie: None,
            ..run_config()
        };

        let err = run_giveaway(&service, run).await.unwrap_err();
        assert!(err.to_string().contains("GIVEAWAY_SESSION_COOKIE"));
    }
}
