pub mod client;
pub mod error;
pub mod throttle;
pub mod types;

pub use client::{ClientConfig, InstagramClient, InstagramConnector};
pub use error::{InstagramError, Result};
pub use throttle::{RequestThrottle, ThrottleConfig};
pub use types::{Comment, CommentPage, Post};

use async_trait::async_trait;
use std::sync::Arc;

/// The operations the giveaway flow needs from Instagram.
///
/// Implementations report failures through the [`InstagramError`]
/// categories so callers can tell a missing post from a private one, a
/// throttled request, or a plain connection problem.
#[async_trait]
pub trait InstagramApi: Send + Sync {
    /// Resolve a post by its shortcode.
    async fn post_by_shortcode(&self, shortcode: &str) -> Result<Post>;

    /// Fetch one page of top-level comments. `after` is the cursor returned
    /// by the previous page, `None` for the first page.
    async fn comments_page(
        &self,
        shortcode: &str,
        page_size: u32,
        after: Option<&str>,
    ) -> Result<CommentPage>;

    /// Username of the logged-in account, `None` when the credential does
    /// not resolve to one.
    async fn current_username(&self) -> Result<Option<String>>;
}

/// Builds a client bound to a browser session cookie. Building is local;
/// nothing is sent upstream until the client is used.
pub trait Connector: Send + Sync {
    fn connect(&self, session_cookie: &str) -> Result<Arc<dyn InstagramApi>>;
}
