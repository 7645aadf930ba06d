//! Paginated comment retrieval with pacing and retry
//!
//! Instagram throttles aggressively and often answers with a 200 whose body
//! says "something went wrong". The retriever paces page requests, retries
//! the whole iteration on transient failures with exponential backoff, and
//! gives up immediately on rate limits and hard errors.

use instagram::{InstagramApi, InstagramError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{GiveawayError, GiveawayResult};
use crate::models::RawComment;

/// Message fragments that mark an upstream failure as safe to retry
const TRANSIENT_MARKERS: [&str; 4] = [
    "something went wrong",
    "try again",
    "temporarily unavailable",
    "server error",
];

/// Pacing and retry knobs for one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Comments requested per page
    pub page_size: u32,
    /// Base sleep between pages
    pub pagination_delay: Duration,
    /// Comments fetched before the pacing starts to grow
    pub progressive_threshold: usize,
    /// Growth applied per additional block of `progressive_threshold` comments
    pub progressive_factor: f64,
    /// Comment iterations attempted before giving up on transient errors
    pub max_attempts: u32,
    /// Sleep before the first retry, doubled on each following retry
    pub retry_backoff: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: 12,
            pagination_delay: Duration::from_secs(1),
            progressive_threshold: 50,
            progressive_factor: 1.2,
            max_attempts: 3,
            retry_backoff: Duration::from_secs(5),
        }
    }
}

impl FetchSettings {
    /// Sleep after a page boundary once `fetched` comments are collected
    pub fn pacing_delay(&self, fetched: usize) -> Duration {
        if self.progressive_threshold == 0 || fetched <= self.progressive_threshold {
            return self.pagination_delay;
        }

        let blocks = (fetched - 1) / self.progressive_threshold;
        let factor = self
            .progressive_factor
            .powi(i32::try_from(blocks).unwrap_or(i32::MAX));
        let micros = self.pagination_delay.as_micros() as f64 * factor;
        Duration::from_micros(micros.round() as u64)
    }
}

/// How a failed upstream call should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    RateLimited,
    Transient,
    Fatal,
}

/// True when the message looks like throttling
pub fn is_rate_limit_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("429") || message.contains("rate") || message.contains("too many")
}

/// True when the message describes a temporary upstream condition
pub fn is_transient_message(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Classify an upstream failure. Rate limits win over transient markers.
pub fn classify(err: &InstagramError) -> FailureClass {
    match err {
        InstagramError::RateLimited(_) => FailureClass::RateLimited,
        InstagramError::Connection(message) if is_rate_limit_message(message) => {
            FailureClass::RateLimited
        }
        InstagramError::Connection(message) if is_transient_message(message) => {
            FailureClass::Transient
        }
        _ => FailureClass::Fatal,
    }
}

/// A failed iteration and how far it got
struct PageFailure {
    error: InstagramError,
    collected: usize,
}

/// Fetches every comment of a post through an [`InstagramApi`]
#[derive(Debug, Clone, Default)]
pub struct CommentRetriever {
    settings: FetchSettings,
}

impl CommentRetriever {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    /// Fetch all comments of the post identified by `shortcode`
    ///
    /// Only the comments of the successful attempt are returned; a retry
    /// discards everything collected before it.
    pub async fn fetch_comments(
        &self,
        client: &dyn InstagramApi,
        shortcode: &str,
    ) -> GiveawayResult<Vec<RawComment>> {
        let post = client
            .post_by_shortcode(shortcode)
            .await
            .map_err(|err| post_lookup_error(shortcode, err))?;

        debug!(
            shortcode,
            owner = post.owner_username.as_deref().unwrap_or("unknown"),
            expected = post.comment_count,
            "Resolved post"
        );

        let max_attempts = self.settings.max_attempts.max(1);
        let mut backoff = self.settings.retry_backoff;
        let mut attempt = 1;

        loop {
            let failure = match self.collect_all(client, &post.shortcode).await {
                Ok(comments) => {
                    info!("Fetched {} comments from post {}", comments.len(), shortcode);
                    return Ok(comments);
                }
                Err(failure) => failure,
            };

            match classify(&failure.error) {
                FailureClass::RateLimited => {
                    warn!(
                        shortcode,
                        collected = failure.collected,
                        "Rate limited while fetching comments: {}",
                        failure.error
                    );
                    return Err(GiveawayError::RateLimited);
                }
                FailureClass::Transient if attempt < max_attempts => {
                    warn!(
                        "Transient error fetching comments for {} (attempt {}/{}): {}. Retrying in {:.1}s",
                        shortcode,
                        attempt,
                        max_attempts,
                        failure.error,
                        backoff.as_secs_f64()
                    );
                    sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                FailureClass::Transient => {
                    error!(
                        "Giving up on comments for {} after {} attempts: {}",
                        shortcode, max_attempts, failure.error
                    );
                    return Err(GiveawayError::UpstreamFailure {
                        message: format!(
                            "Error while fetching comments for post '{shortcode}' after {max_attempts} attempts: {}. Please try again later.",
                            failure.error.message()
                        ),
                        collected: failure.collected,
                    });
                }
                FailureClass::Fatal => {
                    error!(
                        shortcode,
                        collected = failure.collected,
                        "Error while fetching comments: {}",
                        failure.error
                    );
                    return Err(GiveawayError::UpstreamFailure {
                        message: format!(
                            "Error while fetching comments for post '{shortcode}' after {} comment(s): {}. Some comments may have been missed.",
                            failure.collected,
                            failure.error.message()
                        ),
                        collected: failure.collected,
                    });
                }
            }
        }
    }

    /// One full pass over every page, pacing between pages
    async fn collect_all(
        &self,
        client: &dyn InstagramApi,
        shortcode: &str,
    ) -> Result<Vec<RawComment>, PageFailure> {
        let mut comments: Vec<RawComment> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = client
                .comments_page(shortcode, self.settings.page_size, cursor.as_deref())
                .await
                .map_err(|error| PageFailure {
                    error,
                    collected: comments.len(),
                })?;

            comments.extend(page.comments.into_iter().map(RawComment::from));

            let Some(next) = page.next_cursor else {
                return Ok(comments);
            };

            let delay = self.settings.pacing_delay(comments.len());
            debug!(
                shortcode,
                fetched = comments.len(),
                delay_ms = delay.as_millis() as u64,
                "Pausing between comment pages"
            );
            sleep(delay).await;
            cursor = Some(next);
        }
    }
}

fn post_lookup_error(shortcode: &str, err: InstagramError) -> GiveawayError {
    match err {
        InstagramError::NotFound(_) => GiveawayError::NotFound {
            shortcode: shortcode.to_string(),
        },
        InstagramError::LoginRequired(_) => GiveawayError::Forbidden {
            shortcode: shortcode.to_string(),
        },
        ref other if classify(other) == FailureClass::RateLimited => {
            warn!(shortcode, "Rate limited while loading post: {}", other);
            GiveawayError::RateLimited
        }
        other => GiveawayError::UpstreamFailure {
            message: format!(
                "Failed to fetch post '{shortcode}': {}. Check your network connection and try again.",
                other.message()
            ),
            collected: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use instagram::{Comment, CommentPage, Post};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Upstream double replaying scripted page results
    struct ScriptedInstagram {
        post: Result<Post, InstagramError>,
        pages: Mutex<VecDeque<Result<CommentPage, InstagramError>>>,
        page_calls: AtomicUsize,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedInstagram {
        fn new(pages: Vec<Result<CommentPage, InstagramError>>) -> Self {
            Self {
                post: Ok(Post {
                    shortcode: "ABC123".to_string(),
                    owner_username: Some("host".to_string()),
                    comment_count: None,
                }),
                pages: Mutex::new(pages.into()),
                page_calls: AtomicUsize::new(0),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn with_post_error(err: InstagramError) -> Self {
            Self {
                post: Err(err),
                ..Self::new(Vec::new())
            }
        }

        fn page_calls(&self) -> usize {
            self.page_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InstagramApi for ScriptedInstagram {
        async fn post_by_shortcode(&self, _shortcode: &str) -> instagram::Result<Post> {
            self.post.clone()
        }

        async fn comments_page(
            &self,
            _shortcode: &str,
            _page_size: u32,
            after: Option<&str>,
        ) -> instagram::Result<CommentPage> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            self.cursors.lock().unwrap().push(after.map(str::to_string));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CommentPage::default()))
        }

        async fn current_username(&self) -> instagram::Result<Option<String>> {
            Ok(None)
        }
    }

    fn comment(username: &str, ts: i64) -> Comment {
        Comment {
            id: ts.to_string(),
            owner_username: username.to_string(),
            text: "nice!".to_string(),
            created_at: DateTime::from_timestamp(ts, 0).unwrap(),
        }
    }

    fn page(usernames: &[&str], next: Option<&str>) -> Result<CommentPage, InstagramError> {
        Ok(CommentPage {
            comments: usernames
                .iter()
                .enumerate()
                .map(|(i, name)| comment(name, i as i64))
                .collect(),
            next_cursor: next.map(str::to_string),
        })
    }

    /// Pages of `page_size` comments covering `total` comments
    fn pages_of(total: usize, page_size: usize) -> Vec<Result<CommentPage, InstagramError>> {
        let names: Vec<String> = (0..total).map(|i| format!("user{i}")).collect();
        let chunks: Vec<_> = names.chunks(page_size).collect();
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
                let next = (i + 1 < chunks.len()).then(|| format!("cursor{}", i + 1));
                page(&refs, next.as_deref())
            })
            .collect()
    }

    /// Virtual time moves in whole milliseconds
    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(10),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    fn transient() -> InstagramError {
        InstagramError::Connection("something went wrong".to_string())
    }

    #[test]
    fn test_transient_classifier() {
        for (message, expected) in [
            ("something went wrong", true),
            ("Please try again later", true),
            ("temporarily unavailable", true),
            ("Internal server error occurred", true),
            ("Post not found", false),
            ("Login required", false),
        ] {
            assert_eq!(is_transient_message(message), expected, "{message}");
        }
    }

    #[test]
    fn test_rate_limit_classifier() {
        for (message, expected) in [
            ("429 Too Many Requests", true),
            ("rate limit exceeded", true),
            ("too many requests", true),
            ("something went wrong", false),
            ("Post not found", false),
        ] {
            assert_eq!(is_rate_limit_message(message), expected, "{message}");
        }
    }

    #[test]
    fn test_classify_prefers_rate_limit() {
        let err = InstagramError::Connection("429 - please try again".to_string());
        assert_eq!(classify(&err), FailureClass::RateLimited);
        assert_eq!(
            classify(&InstagramError::RateLimited("x".to_string())),
            FailureClass::RateLimited
        );
        assert_eq!(
            classify(&InstagramError::Parse("something went wrong".to_string())),
            FailureClass::Fatal
        );
    }

    #[test]
    fn test_pacing_grows_after_threshold() {
        let settings = FetchSettings::default();
        assert_eq!(settings.pacing_delay(12), Duration::from_secs(1));
        assert_eq!(settings.pacing_delay(50), Duration::from_secs(1));
        assert_eq!(settings.pacing_delay(60), Duration::from_millis(1200));
        assert_eq!(settings.pacing_delay(100), Duration::from_millis(1200));
        assert_eq!(settings.pacing_delay(101), Duration::from_millis(1440));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_across_pages() {
        let upstream = ScriptedInstagram::new(vec![
            page(&["alice", "bob"], Some("c1")),
            page(&["carol"], None),
        ]);
        let retriever = CommentRetriever::default();

        let comments = retriever.fetch_comments(&upstream, "ABC123").await.unwrap();

        let names: Vec<_> = comments.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
        assert_eq!(
            *upstream.cursors.lock().unwrap(),
            vec![None, Some("c1".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_between_pages() {
        let upstream = ScriptedInstagram::new(pages_of(13, 12));
        let retriever = CommentRetriever::default();
        let start = Instant::now();

        let comments = retriever.fetch_comments(&upstream, "ABC123").await.unwrap();

        assert_eq!(comments.len(), 13);
        assert_elapsed(start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_sections_are_paced_more_slowly() {
        // 61 comments: 6 boundaries, the last one after 60 comments
        let upstream = ScriptedInstagram::new(pages_of(61, 12));
        let retriever = CommentRetriever::default();
        let start = Instant::now();

        let comments = retriever.fetch_comments(&upstream, "BIGPOST").await.unwrap();

        assert_eq!(comments.len(), 61);
        assert_elapsed(start, Duration::from_secs(4) + Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_not_found_stops_before_iteration() {
        let upstream =
            ScriptedInstagram::with_post_error(InstagramError::NotFound("404".to_string()));

        let err = CommentRetriever::default()
            .fetch_comments(&upstream, "MISSING")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GiveawayError::NotFound {
                shortcode: "MISSING".to_string()
            }
        );
        assert_eq!(upstream.page_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_private_post_is_forbidden() {
        let upstream =
            ScriptedInstagram::with_post_error(InstagramError::LoginRequired("private".to_string()));

        let err = CommentRetriever::default()
            .fetch_comments(&upstream, "PRIVATE")
            .await
            .unwrap_err();

        assert!(matches!(err, GiveawayError::Forbidden { .. }));
        assert!(err.to_string().contains("private account"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_on_post_load() {
        let upstream = ScriptedInstagram::with_post_error(InstagramError::Connection(
            "429 Too Many Requests".to_string(),
        ));

        let err = CommentRetriever::default()
            .fetch_comments(&upstream, "RL")
            .await
            .unwrap_err();

        assert_eq!(err, GiveawayError::RateLimited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_error_on_post_load() {
        let upstream = ScriptedInstagram::with_post_error(InstagramError::Connection(
            "network down".to_string(),
        ));

        let err = CommentRetriever::default()
            .fetch_comments(&upstream, "BROKEN")
            .await
            .unwrap_err();

        assert!(matches!(err, GiveawayError::UpstreamFailure { collected: 0, .. }));
        assert!(err.to_string().contains("Failed to fetch post"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_during_iteration_does_not_retry() {
        let upstream = ScriptedInstagram::new(vec![
            page(&["alice"], Some("c1")),
            Err(InstagramError::Connection("429".to_string())),
        ]);
        let start = Instant::now();

        let err = CommentRetriever::default()
            .fetch_comments(&upstream, "RL")
            .await
            .unwrap_err();

        assert_eq!(err, GiveawayError::RateLimited);
        assert_eq!(upstream.page_calls(), 2);
        // Only the single pacing pause, no backoff
        assert_elapsed(start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_exhaust_retries() {
        let upstream = ScriptedInstagram::new(vec![Err(transient()), Err(transient()), Err(transient())]);
        let start = Instant::now();

        let err = CommentRetriever::default()
            .fetch_comments(&upstream, "TRANSIENT")
            .await
            .unwrap_err();

        assert!(matches!(err, GiveawayError::UpstreamFailure { .. }));
        assert!(err.to_string().contains("after 3 attempts"));
        assert_eq!(upstream.page_calls(), 3);
        // Two backoffs: 5s then 10s
        assert_elapsed(start, Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_restarts_from_scratch() {
        let upstream = ScriptedInstagram::new(vec![
            page(&["stale"], Some("c1")),
            Err(transient()),
            page(&["u1"], None),
        ]);

        let comments = CommentRetriever::default()
            .fetch_comments(&upstream, "RECOVER")
            .await
            .unwrap();

        let names: Vec<_> = comments.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(names, ["u1"]);
        assert_eq!(
            *upstream.cursors.lock().unwrap(),
            vec![None, Some("c1".to_string()), None]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_fails_immediately() {
        let upstream = ScriptedInstagram::new(vec![
            page(&["alice", "bob"], Some("c1")),
            Err(InstagramError::Connection("some unique error".to_string())),
        ]);
        let start = Instant::now();

        let err = CommentRetriever::default()
            .fetch_comments(&upstream, "NONTRANSIENT")
            .await
            .unwrap_err();

        match &err {
            GiveawayError::UpstreamFailure { message, collected } => {
                assert_eq!(*collected, 2);
                assert!(message.contains("Error while fetching comments"));
                assert!(message.contains("after 2 comment(s)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(upstream.page_calls(), 2);
        assert_elapsed(start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_budget() {
        let upstream = ScriptedInstagram::new(vec![Err(transient()), page(&["late"], None)]);
        let retriever = CommentRetriever::new(FetchSettings {
            max_attempts: 1,
            ..FetchSettings::default()
        });

        let err = retriever.fetch_comments(&upstream, "ONCE").await.unwrap_err();

        assert!(matches!(err, GiveawayError::UpstreamFailure { .. }));
        assert_eq!(upstream.page_calls(), 1);
    }
}
