use serde::{Deserialize, Serialize};

use super::repo_types::{CommentCount, Post, PostAuthor, PostSummary};
use crate::comments::dto::CommentNode;

/// Query string of `GET /api/posts`.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostSummary>,
    pub pagination: Pagination,
}

/// Body of `POST /api/posts` and `PUT /api/posts/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub published: bool,
}

/// Published post as served to readers.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: PostAuthor,
    pub comments: Vec<CommentNode>,
    #[serde(rename = "_count")]
    pub count: CommentCount,
}
