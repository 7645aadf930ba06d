//! Giveaway operations, one method per caller-facing action

use tracing::info;

use crate::aggregation::summarize;
use crate::error::GiveawayResult;
use crate::models::{
    CommentSummary, LoginRequest, LoginResponse, PickWinnersRequest, PickWinnersResponse,
    ValidateSessionResponse,
};
use crate::retriever::CommentRetriever;
use crate::selector::pick_winners;
use crate::session::SessionStore;
use crate::shortcode::extract_shortcode;

/// Owns the session store and the retriever for the process lifetime
#[derive(Clone)]
pub struct GiveawayService {
    sessions: SessionStore,
    retriever: CommentRetriever,
}

impl GiveawayService {
    pub fn new(sessions: SessionStore, retriever: CommentRetriever) -> Self {
        Self {
            sessions,
            retriever,
        }
    }

    /// Open a session from a browser cookie
    pub async fn login(&self, request: &LoginRequest) -> GiveawayResult<LoginResponse> {
        request.validate()?;
        info!("Login attempt via session cookie");
        self.sessions.login(request.session_cookie.trim()).await
    }

    /// Close a session; always succeeds
    pub async fn logout(&self, session_id: &str) {
        info!("Logout request for session {}", session_id);
        self.sessions.remove(session_id).await;
    }

    /// Check a session without contacting Instagram
    pub async fn validate_session(&self, session_id: &str) -> GiveawayResult<ValidateSessionResponse> {
        let username = self.sessions.validate(session_id).await?;
        Ok(ValidateSessionResponse { username })
    }

    /// Fetch and aggregate the commenters of the post at `url`
    pub async fn fetch_comments(&self, session_id: &str, url: &str) -> GiveawayResult<CommentSummary> {
        info!("Received fetch-comments request for URL: {} (session={})", url, session_id);

        let client = self.sessions.get_client(session_id).await?;
        let shortcode = extract_shortcode(url)?;

        let comments = self.retriever.fetch_comments(client.as_ref(), &shortcode).await?;
        let summary = summarize(&comments);

        info!(
            "Completed scraping: {} unique users, {} total comments",
            summary.users.len(),
            summary.total_comments
        );
        Ok(summary)
    }

    /// Select winners among the commenters of a previous fetch
    pub fn pick_winners(&self, request: &PickWinnersRequest) -> GiveawayResult<PickWinnersResponse> {
        request.validate()?;
        info!(
            "Received pick-winners request: {} users, {} winners, min_comments={}",
            request.users.len(),
            request.num_winners,
            request.min_comments
        );

        let winners = pick_winners(&request.users, request.num_winners, request.min_comments)?;
        info!("Selected winners: {:?}", winners);
        Ok(PickWinnersResponse { winners })
    }
}
