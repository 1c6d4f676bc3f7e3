use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::Author;

/// Comment record in the database. `parent_id = None` marks a top-level comment.
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
pub struct CommentRow {
    #[sqlx(flatten)]
    pub comment: Comment,
    pub author_name: String,
    pub author_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: Author,
}

impl From<CommentRow> for CommentWithAuthor {
    fn from(r: CommentRow) -> Self {
        Self {
            author: Author {
                id: r.comment.author_id,
                name: r.author_name,
                image: r.author_image,
            },
            comment: r.comment,
        }
    }
}

pub struct NewComment<'a> {
    pub content: &'a str,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
}
