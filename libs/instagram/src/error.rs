use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstagramError>;

/// Failure categories reported by the upstream client.
#[derive(Debug, Clone, Error)]
pub enum InstagramError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Login required: {0}")]
    LoginRequired(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl InstagramError {
    /// Upstream message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            InstagramError::NotFound(msg)
            | InstagramError::LoginRequired(msg)
            | InstagramError::RateLimited(msg)
            | InstagramError::Connection(msg)
            | InstagramError::Parse(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for InstagramError {
    fn from(err: reqwest::Error) -> Self {
        InstagramError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for InstagramError {
    fn from(err: serde_json::Error) -> Self {
        InstagramError::Parse(err.to_string())
    }
}
