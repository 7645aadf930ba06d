//! Values flowing in and out of the giveaway operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{GiveawayError, GiveawayResult};

/// Upper bound for both the winner count and the minimum-comment threshold
pub const MAX_WINNERS: usize = 5;
pub const MAX_MIN_COMMENTS: u32 = 5;

/// A comment as fetched, before aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl From<instagram::Comment> for RawComment {
    fn from(comment: instagram::Comment) -> Self {
        Self {
            username: comment.owner_username,
            text: comment.text,
            timestamp: comment.created_at,
        }
    }
}

/// A commenter and how many comments they left
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentUser {
    pub username: String,
    pub comment_count: u32,
}

/// Result of the fetch path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub users: Vec<CommentUser>,
    pub total_comments: usize,
}

/// Login payload
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub session_cookie: String,
}

impl LoginRequest {
    pub fn validate(&self) -> GiveawayResult<()> {
        if self.session_cookie.trim().is_empty() {
            return Err(GiveawayError::InvalidInput(
                "Session cookie is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Login result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub username: String,
}

/// Session validation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateSessionResponse {
    pub username: String,
}

/// Winner selection payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickWinnersRequest {
    pub users: Vec<CommentUser>,
    pub num_winners: usize,
    pub min_comments: u32,
}

impl PickWinnersRequest {
    /// Check the bounds the selection relies on
    pub fn validate(&self) -> GiveawayResult<()> {
        if !(1..=MAX_WINNERS).contains(&self.num_winners) {
            return Err(GiveawayError::InvalidInput(format!(
                "num_winners must be between 1 and {MAX_WINNERS}, got {}",
                self.num_winners
            )));
        }

        if !(1..=MAX_MIN_COMMENTS).contains(&self.min_comments) {
            return Err(GiveawayError::InvalidInput(format!(
                "min_comments must be between 1 and {MAX_MIN_COMMENTS}, got {}",
                self.min_comments
            )));
        }

        let mut seen = HashSet::with_capacity(self.users.len());
        for user in &self.users {
            if user.comment_count == 0 {
                return Err(GiveawayError::InvalidInput(format!(
                    "comment_count for '{}' must be at least 1",
                    user.username
                )));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(GiveawayError::InvalidInput(format!(
                    "username '{}' appears more than once",
                    user.username
                )));
            }
        }

        Ok(())
    }
}

/// Winner selection result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickWinnersResponse {
    pub winners: Vec<String>,
}
