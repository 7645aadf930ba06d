//! Error taxonomy for the giveaway service

use thiserror::Error;

/// Every way a giveaway operation can fail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GiveawayError {
    /// Malformed caller input, such as an unrecognised post URL
    #[error("{0}")]
    InvalidInput(String),

    /// The post does not exist
    #[error(
        "Post with shortcode '{shortcode}' was not found. It may have been deleted or the URL is incorrect."
    )]
    NotFound { shortcode: String },

    /// The post is private or requires a login the session cannot satisfy
    #[error(
        "Post with shortcode '{shortcode}' belongs to a private account. Log in with an account that follows it, or pick a public post."
    )]
    Forbidden { shortcode: String },

    /// Instagram is throttling us
    #[error("Instagram is rate-limiting requests. Please wait a few minutes and try again.")]
    RateLimited,

    /// Any other upstream problem, including exhausted retries
    #[error("{message}")]
    UpstreamFailure { message: String, collected: usize },

    /// Unknown or expired session
    #[error("Session not found or has expired. Please log in again.")]
    SessionNotFound,

    /// The session cookie did not resolve to an account
    #[error(
        "Login failed: {reason}. Make sure you are logged into instagram.com, copy a fresh 'sessionid' cookie value, and try again."
    )]
    LoginFailed { reason: String },

    /// Fewer eligible commenters than requested winners
    #[error(
        "Only {eligible} user(s) meet the minimum of {min_comments} comment(s), but {requested} winner(s) requested. Try lowering the minimum-comment threshold."
    )]
    InsufficientEligibleUsers {
        eligible: usize,
        min_comments: u32,
        requested: usize,
    },
}

impl GiveawayError {
    /// Whether the caller may retry the same request after waiting
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GiveawayError::RateLimited | GiveawayError::UpstreamFailure { .. }
        )
    }
}

/// Type alias for giveaway results
pub type GiveawayResult<T> = Result<T, GiveawayError>;
