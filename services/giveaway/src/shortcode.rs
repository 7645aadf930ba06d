//! Post URL parsing

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{GiveawayError, GiveawayResult};

/// Extract the shortcode from a post URL
///
/// Accepts `/p/`, `/reel/` and `/tv/` paths on `instagram.com`, with or
/// without scheme and `www.`.
pub fn extract_shortcode(url: &str) -> GiveawayResult<String> {
    static POST_URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = POST_URL_REGEX.get_or_init(|| {
        Regex::new(r"^(?i:https?://)?(?i:www\.)?(?i:instagram\.com)/(?:p|reel|tv)/([A-Za-z0-9_-]+)")
            .expect("Failed to compile post URL regex")
    });

    regex
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|code| code.as_str().to_string())
        .ok_or_else(|| {
            GiveawayError::InvalidInput(format!(
                "Could not extract shortcode from URL: {url:?}. Expected format: https://www.instagram.com/p/<shortcode>/"
            ))
        })
}
