use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::Author;

/// Category values accepted on write. Filtering compares raw strings.
pub const CATEGORIES: &[&str] = &[
    "Technology",
    "Lifestyle",
    "Travel",
    "Food",
    "Health",
    "Business",
    "Education",
    "Other",
];

const SUMMARY_TITLE_CHARS: usize = 150;

/// Post record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub published: bool,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommentCount {
    pub comments: i64,
}

/// Flat feed row as returned by the join with `users`.
#[derive(Debug, FromRow)]
pub struct PostSummaryRow {
    pub id: Uuid,
    pub title: String,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub published: bool,
    pub views: i64,
    pub created_at: OffsetDateTime,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_image: Option<String>,
    pub comment_count: i64,
}

/// Feed card: a published post without its body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub excerpt: Option<String>,
    pub summary: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub published: bool,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: Author,
    #[serde(rename = "_count")]
    pub count: CommentCount,
}

impl From<PostSummaryRow> for PostSummary {
    fn from(r: PostSummaryRow) -> Self {
        Self {
            summary: summarize(r.excerpt.as_deref(), &r.title),
            id: r.id,
            title: r.title,
            excerpt: r.excerpt,
            image: r.image,
            category: r.category,
            published: r.published,
            views: r.views,
            created_at: r.created_at,
            author: Author {
                id: r.author_id,
                name: r.author_name,
                image: r.author_image,
            },
            count: CommentCount {
                comments: r.comment_count,
            },
        }
    }
}

/// Excerpt when present, otherwise the title cut to 150 characters and
/// marked with `...`.
pub fn summarize(excerpt: Option<&str>, title: &str) -> String {
    match excerpt.map(str::trim) {
        Some(e) if !e.is_empty() => e.to_string(),
        _ => {
            let cut: String = title.chars().take(SUMMARY_TITLE_CHARS).collect();
            format!("{cut}...")
        }
    }
}

/// Published post joined with its author's profile fields.
#[derive(Debug, FromRow)]
pub struct PostDetailRow {
    #[sqlx(flatten)]
    pub post: Post,
    pub author_name: String,
    pub author_image: Option<String>,
    pub author_bio: Option<String>,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostAuthor {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostDetailRecord {
    pub post: Post,
    pub author: PostAuthor,
    pub comment_count: i64,
}

impl From<PostDetailRow> for PostDetailRecord {
    fn from(r: PostDetailRow) -> Self {
        Self {
            author: PostAuthor {
                id: r.post.author_id,
                name: r.author_name,
                image: r.author_image,
                bio: r.author_bio,
            },
            post: r.post,
            comment_count: r.comment_count,
        }
    }
}

/// Author-supplied fields, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// One-based page of `limit` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}
