use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{
    FeedFilter, PageRequest, Post, PostChanges, PostDetailRecord, PostDetailRow, PostSummary,
    PostSummaryRow,
};

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Published posts matching `filter`, newest first, plus the filtered total.
    async fn list_published(
        &self,
        filter: &FeedFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<PostSummary>, i64)>;
    async fn list_published_by_author(&self, author_id: Uuid) -> anyhow::Result<Vec<PostSummary>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    /// Published post with author profile and comment count.
    async fn find_published_detail(&self, id: Uuid) -> anyhow::Result<Option<PostDetailRecord>>;
    /// Bumps the view counter of a published post and returns the new value.
    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>>;
    async fn create(&self, author_id: Uuid, changes: &PostChanges) -> anyhow::Result<Post>;
    async fn update(&self, id: Uuid, changes: &PostChanges) -> anyhow::Result<Option<Post>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Escapes LIKE wildcards so user text matches literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[derive(Clone)]
pub struct PgPostRepository {
    db: PgPool,
}

impl PgPostRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn list_published(
        &self,
        filter: &FeedFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<PostSummary>, i64)> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, PostSummaryRow>(
            r#"
            SELECT p.id, p.title, p.excerpt, p.image, p.category, p.published, p.views,
                   p.created_at, p.author_id,
                   u.name  AS author_name,
                   u.image AS author_image,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
              FROM posts p
              JOIN users u ON u.id = p.author_id
             WHERE p.published
               AND ($1::text IS NULL OR p.title ILIKE $1 OR p.content ILIKE $1)
               AND ($2::text IS NULL OR p.category = $2)
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(pattern.as_deref())
        .bind(filter.category.as_deref())
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list feed page")?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
              FROM posts p
             WHERE p.published
               AND ($1::text IS NULL OR p.title ILIKE $1 OR p.content ILIKE $1)
               AND ($2::text IS NULL OR p.category = $2)
            "#,
        )
        .bind(pattern.as_deref())
        .bind(filter.category.as_deref())
        .fetch_one(&self.db)
        .await
        .context("count feed")?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn list_published_by_author(&self, author_id: Uuid) -> anyhow::Result<Vec<PostSummary>> {
        let rows = sqlx::query_as::<_, PostSummaryRow>(
            r#"
            SELECT p.id, p.title, p.excerpt, p.image, p.category, p.published, p.views,
                   p.created_at, p.author_id,
                   u.name  AS author_name,
                   u.image AS author_image,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
              FROM posts p
              JOIN users u ON u.id = p.author_id
             WHERE p.author_id = $1 AND p.published
             ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.db)
        .await
        .context("list posts by author")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, excerpt, image, category, published, views,
                   created_at, updated_at, author_id
              FROM posts
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find post")?;
        Ok(post)
    }

    async fn find_published_detail(&self, id: Uuid) -> anyhow::Result<Option<PostDetailRecord>> {
        let row = sqlx::query_as::<_, PostDetailRow>(
            r#"
            SELECT p.id, p.title, p.content, p.excerpt, p.image, p.category, p.published,
                   p.views, p.created_at, p.updated_at, p.author_id,
                   u.name  AS author_name,
                   u.image AS author_image,
                   u.bio   AS author_bio,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
              FROM posts p
              JOIN users u ON u.id = p.author_id
             WHERE p.id = $1 AND p.published
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find post detail")?;
        Ok(row.map(Into::into))
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let views = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE posts
               SET views = views + 1
             WHERE id = $1 AND published
         RETURNING views
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("increment post views")?;
        Ok(views)
    }

    async fn create(&self, author_id: Uuid, changes: &PostChanges) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, content, excerpt, image, category, published, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, content, excerpt, image, category, published, views,
                      created_at, updated_at, author_id
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(changes.excerpt.as_deref())
        .bind(changes.image.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.published)
        .bind(author_id)
        .fetch_one(&self.db)
        .await
        .context("insert post")?;
        Ok(post)
    }

    async fn update(&self, id: Uuid, changes: &PostChanges) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
               SET title = $2, content = $3, excerpt = $4, image = $5,
                   category = $6, published = $7, updated_at = now()
             WHERE id = $1
         RETURNING id, title, content, excerpt, image, category, published, views,
                   created_at, updated_at, author_id
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(changes.excerpt.as_deref())
        .bind(changes.image.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.published)
        .fetch_optional(&self.db)
        .await
        .context("update post")?;
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(res.rows_affected() > 0)
    }
}
