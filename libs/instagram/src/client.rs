use async_trait::async_trait;
use common::config::{load_env, require_positive};
use common::error::ConfigurationResult;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{InstagramError, Result};
use crate::throttle::{RequestThrottle, ThrottleConfig};
use crate::types::{CommentPage, Envelope, MediaData, Post, ViewerData};
use crate::{Connector, InstagramApi};

/// Query hash resolving a post from its shortcode.
pub const POST_QUERY_HASH: &str = "2b0673e0dc4580674a88d426fe00ea90";

/// Query hash paging through a post's top-level comments.
pub const COMMENTS_QUERY_HASH: &str = "97b41c52301f77ce508f55e66d17620e";

/// Query hash returning the account behind the session cookie.
pub const VIEWER_QUERY_HASH: &str = "d6f4427fbe92d846298cf93df0b937d3";

/// Instagram's web app id, sent on every request.
const WEB_APP_ID: &str = "936619743392459";

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upstream base URL, without trailing slash
    pub base_url: String,
    /// User agent presented to Instagram
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig from environment variables
    ///
    /// # Environment Variables
    /// - `INSTAGRAM_BASE_URL`: upstream base URL (default: "https://www.instagram.com")
    /// - `INSTAGRAM_USER_AGENT`: user agent header (default: desktop Chrome)
    /// - `INSTAGRAM_TIMEOUT_SECS`: request timeout (default: 30)
    pub fn from_env() -> ConfigurationResult<Self> {
        let config: ClientConfig = load_env("INSTAGRAM")?;
        require_positive("INSTAGRAM_TIMEOUT_SECS", config.timeout_secs)?;
        Ok(config)
    }
}

/// Instagram web GraphQL client authenticated by a `sessionid` cookie.
pub struct InstagramClient {
    http: reqwest::Client,
    base_url: String,
    throttle: RequestThrottle,
}

impl InstagramClient {
    pub fn new(config: &ClientConfig, session_cookie: &str) -> Result<Self> {
        let cookie = HeaderValue::from_str(&format!("sessionid={}", session_cookie.trim()))
            .map_err(|_| {
                InstagramError::LoginRequired(
                    "session cookie contains characters not allowed in a header".to_string(),
                )
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, cookie);
        headers.insert("x-ig-app-id", HeaderValue::from_static(WEB_APP_ID));
        headers.insert(header::REFERER, HeaderValue::from_static("https://www.instagram.com/"));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            throttle: RequestThrottle::new(ThrottleConfig::default()),
        })
    }

    /// Run a GraphQL query and unwrap its envelope.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query_hash: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        self.throttle.acquire("graphql").await;

        let url = format!("{}/graphql/query/", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("query_hash", query_hash),
                ("variables", variables.to_string().as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(InstagramError::RateLimited(format!(
                    "429 Too Many Requests: {}",
                    body_excerpt(&body)
                )));
            }
            StatusCode::NOT_FOUND => {
                return Err(InstagramError::NotFound(format!(
                    "404 Not Found: {}",
                    body_excerpt(&body)
                )));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(InstagramError::LoginRequired(format!(
                    "{}: {}",
                    status,
                    body_excerpt(&body)
                )));
            }
            _ if !status.is_success() => {
                return Err(InstagramError::Connection(format!(
                    "HTTP error code {}: {}",
                    status,
                    body_excerpt(&body)
                )));
            }
            _ => {}
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;

        if envelope.status.as_deref() == Some("fail") {
            let message = envelope
                .message
                .unwrap_or_else(|| "request failed without a message".to_string());
            tracing::debug!(query_hash, %message, "Soft failure in 200 response");
            return Err(if envelope.require_login {
                InstagramError::LoginRequired(message)
            } else {
                InstagramError::Connection(message)
            });
        }

        envelope
            .data
            .ok_or_else(|| InstagramError::Parse("response carries no data".to_string()))
    }
}

#[async_trait]
impl InstagramApi for InstagramClient {
    async fn post_by_shortcode(&self, shortcode: &str) -> Result<Post> {
        let data: MediaData = self
            .graphql(POST_QUERY_HASH, json!({ "shortcode": shortcode }))
            .await?;

        let media = data
            .shortcode_media
            .ok_or_else(|| InstagramError::NotFound(format!("no post with shortcode {shortcode}")))?;

        Ok(media.into_post(shortcode))
    }

    async fn comments_page(
        &self,
        shortcode: &str,
        page_size: u32,
        after: Option<&str>,
    ) -> Result<CommentPage> {
        let mut variables = json!({ "shortcode": shortcode, "first": page_size });
        if let Some(cursor) = after {
            variables["after"] = json!(cursor);
        }

        let data: MediaData = self.graphql(COMMENTS_QUERY_HASH, variables).await?;

        let connection = data
            .shortcode_media
            .ok_or_else(|| InstagramError::NotFound(format!("no post with shortcode {shortcode}")))?
            .edge_media_to_parent_comment
            .ok_or_else(|| {
                InstagramError::Parse("response is missing the comment connection".to_string())
            })?;

        let page = connection.into_page()?;
        tracing::debug!(
            shortcode,
            comments = page.comments.len(),
            has_next = page.next_cursor.is_some(),
            "Fetched comment page"
        );
        Ok(page)
    }

    async fn current_username(&self) -> Result<Option<String>> {
        let data: ViewerData = self.graphql(VIEWER_QUERY_HASH, json!({})).await?;
        Ok(data.user.map(|user| user.username))
    }
}

/// Builds [`InstagramClient`]s sharing one configuration.
#[derive(Debug, Clone)]
pub struct InstagramConnector {
    config: ClientConfig,
}

impl InstagramConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl Connector for InstagramConnector {
    fn connect(&self, session_cookie: &str) -> Result<Arc<dyn InstagramApi>> {
        Ok(Arc::new(InstagramClient::new(&self.config, session_cookie)?))
    }
}

fn body_excerpt(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
