use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::Author;

use super::repo_types::CommentWithAuthor;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// A comment with its author and the replies materialized below it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author: Author,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn leaf(c: &CommentWithAuthor) -> Self {
        Self {
            id: c.comment.id,
            content: c.comment.content.clone(),
            created_at: c.comment.created_at,
            updated_at: c.comment.updated_at,
            post_id: c.comment.post_id,
            parent_id: c.comment.parent_id,
            author: c.author.clone(),
            replies: Vec::new(),
        }
    }
}
