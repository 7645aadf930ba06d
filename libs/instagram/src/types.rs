use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{InstagramError, Result};

/// A post resolved from its shortcode.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub shortcode: String,
    pub owner_username: Option<String>,
    pub comment_count: Option<u64>,
}

/// A single top-level comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub owner_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// One page of comments plus the cursor of the next page, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub next_cursor: Option<String>,
}

// --- GraphQL wire format ---

/// Common envelope around every `/graphql/query/` response. A 200 response
/// can still be a failure when `status` is `"fail"`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub require_login: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaData {
    pub shortcode_media: Option<MediaNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaNode {
    #[serde(default)]
    pub shortcode: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerNode>,
    #[serde(default)]
    pub edge_media_to_parent_comment: Option<CommentConnection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerNode {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentConnection {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
    #[serde(default)]
    pub edges: Vec<CommentEdge>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentEdge {
    pub node: CommentNode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentNode {
    pub id: String,
    pub text: String,
    pub created_at: i64,
    pub owner: OwnerNode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewerData {
    pub user: Option<OwnerNode>,
}

impl MediaNode {
    pub(crate) fn into_post(self, requested: &str) -> Post {
        Post {
            shortcode: self.shortcode.unwrap_or_else(|| requested.to_string()),
            owner_username: self.owner.map(|owner| owner.username),
            comment_count: self.edge_media_to_parent_comment.and_then(|c| c.count),
        }
    }
}

impl CommentConnection {
    pub(crate) fn into_page(self) -> Result<CommentPage> {
        let comments = self
            .edges
            .into_iter()
            .map(|edge| edge.node.into_comment())
            .collect::<Result<Vec<_>>>()?;

        let next_cursor = match self.page_info {
            Some(PageInfo {
                has_next_page: true,
                end_cursor: Some(cursor),
            }) => Some(cursor),
            _ => None,
        };

        Ok(CommentPage {
            comments,
            next_cursor,
        })
    }
}

impl CommentNode {
    fn into_comment(self) -> Result<Comment> {
        let created_at = DateTime::from_timestamp(self.created_at, 0).ok_or_else(|| {
            InstagramError::Parse(format!(
                "comment {} has an out-of-range timestamp {}",
                self.id, self.created_at
            ))
        })?;

        Ok(Comment {
            id: self.id,
            owner_username: self.owner.username,
            text: self.text,
            created_at,
        })
    }
}
