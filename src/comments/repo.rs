use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Comment, CommentRow, CommentWithAuthor, NewComment};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Every comment of a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentWithAuthor>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn create(&self, new: NewComment<'_>) -> anyhow::Result<CommentWithAuthor>;
    /// Removes the comment and, through the foreign key, its replies.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgCommentRepository {
    db: PgPool,
}

impl PgCommentRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.content, c.created_at, c.updated_at, c.post_id, c.author_id,
                   c.parent_id,
                   u.name  AS author_name,
                   u.image AS author_image
              FROM comments c
              JOIN users u ON u.id = c.author_id
             WHERE c.post_id = $1
             ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await
        .context("list comments for post")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, created_at, updated_at, post_id, author_id, parent_id
              FROM comments
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find comment")?;
        Ok(comment)
    }

    async fn create(&self, new: NewComment<'_>) -> anyhow::Result<CommentWithAuthor> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (content, post_id, author_id, parent_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, content, created_at, updated_at, post_id, author_id, parent_id
            )
            SELECT i.id, i.content, i.created_at, i.updated_at, i.post_id, i.author_id,
                   i.parent_id,
                   u.name  AS author_name,
                   u.image AS author_image
              FROM inserted i
              JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(new.content)
        .bind(new.post_id)
        .bind(new.author_id)
        .bind(new.parent_id)
        .fetch_one(&self.db)
        .await
        .context("insert comment")?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete comment")?;
        Ok(res.rows_affected() > 0)
    }
}
