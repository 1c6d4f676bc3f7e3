use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{FeedQuery, FeedResponse, Pagination, PostDetail, PostPayload};
use super::repo_types::{CommentCount, FeedFilter, PageRequest, Post, PostChanges, CATEGORIES};
use crate::auth::extractors::{require_caller, require_owner};
use crate::comments::services::load_thread;
use crate::config::FeedConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::uploads::services::release_image;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn page_request(cfg: &FeedConfig, page: Option<i64>, limit: Option<i64>) -> PageRequest {
    let limit = limit
        .filter(|l| *l > 0)
        .unwrap_or(cfg.page_size)
        .min(cfg.max_page_size);
    PageRequest {
        page: page.unwrap_or(1).max(1),
        limit,
    }
}

pub async fn feed(st: &AppState, query: FeedQuery) -> AppResult<FeedResponse> {
    let page = page_request(&st.config.feed, query.page, query.limit);
    let filter = FeedFilter {
        search: non_empty(query.search),
        category: non_empty(query.category),
    };

    let (posts, total) = st.posts.list_published(&filter, page).await?;
    debug!(?filter, page = page.page, total, returned = posts.len(), "feed page");

    Ok(FeedResponse {
        posts,
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: page.total_pages(total),
        },
    })
}

/// Public read of a published post. Every successful call counts one view;
/// the response shows the count as it stood before this read.
pub async fn get_published(st: &AppState, id: Uuid) -> AppResult<PostDetail> {
    let counted = st
        .posts
        .increment_views(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    let record = st
        .posts
        .find_published_detail(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    let comments = load_thread(st, id).await?;

    let mut post = record.post;
    post.views = counted - 1;
    Ok(PostDetail {
        post,
        author: record.author,
        comments,
        count: CommentCount {
            comments: record.comment_count,
        },
    })
}

/// Owner-only read that includes drafts.
pub async fn get_for_edit(st: &AppState, caller: Option<Uuid>, id: Uuid) -> AppResult<Post> {
    let caller = require_caller(caller)?;
    let post = find_post(st, id).await?;
    require_owner(Some(caller), post.author_id)?;
    Ok(post)
}

pub async fn create_post(st: &AppState, caller: Option<Uuid>, payload: PostPayload) -> AppResult<Post> {
    let author_id = require_caller(caller)?;
    let changes = validate(payload)?;
    let post = st.posts.create(author_id, &changes).await?;
    info!(post_id = %post.id, %author_id, published = post.published, "post created");
    Ok(post)
}

pub async fn update_post(
    st: &AppState,
    caller: Option<Uuid>,
    id: Uuid,
    payload: PostPayload,
) -> AppResult<Post> {
    let caller = require_caller(caller)?;
    let existing = find_post(st, id).await?;
    require_owner(Some(caller), existing.author_id)?;
    let changes = validate(payload)?;

    let post = st
        .posts
        .update(id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    if existing.image.is_some() && existing.image != post.image {
        release_image(st, existing.image.as_deref()).await;
    }
    info!(post_id = %id, "post updated");
    Ok(post)
}

pub async fn delete_post(st: &AppState, caller: Option<Uuid>, id: Uuid) -> AppResult<()> {
    let caller = require_caller(caller)?;
    let existing = find_post(st, id).await?;
    require_owner(Some(caller), existing.author_id)?;

    if !st.posts.delete(id).await? {
        return Err(AppError::not_found("Post"));
    }
    release_image(st, existing.image.as_deref()).await;
    info!(post_id = %id, "post deleted");
    Ok(())
}

async fn find_post(st: &AppState, id: Uuid) -> AppResult<Post> {
    st.posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))
}

fn validate(payload: PostPayload) -> AppResult<PostChanges> {
    let title = payload.title.trim();
    let content = payload.content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(AppError::validation("Title and content are required"));
    }

    let category = non_empty(payload.category);
    if let Some(c) = category.as_deref() {
        if !CATEGORIES.contains(&c) {
            return Err(AppError::validation(format!("Unknown category: {c}")));
        }
    }

    Ok(PostChanges {
        title: title.to_string(),
        content: content.to_string(),
        excerpt: non_empty(payload.excerpt),
        image: non_empty(payload.image),
        category,
        published: payload.published,
    })
}
