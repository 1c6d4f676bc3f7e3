use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use super::dto::{CommentNode, CreateCommentRequest};
use super::repo_types::{CommentWithAuthor, NewComment};
use crate::auth::extractors::require_caller;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Reply levels materialized under a top-level comment.
pub const DEFAULT_REPLY_DEPTH: usize = 1;

/// Builds the thread of a post from its comments in storage order.
///
/// Top-level comments come out newest first. Replies keep storage order and
/// are attached down to `depth` levels; anything deeper is dropped.
pub fn assemble_thread(comments: &[CommentWithAuthor], depth: usize) -> Vec<CommentNode> {
    let mut roots: Vec<&CommentWithAuthor> = Vec::new();
    let mut children: HashMap<Uuid, Vec<&CommentWithAuthor>> = HashMap::new();
    for c in comments {
        match c.comment.parent_id {
            None => roots.push(c),
            Some(parent) => children.entry(parent).or_default().push(c),
        }
    }
    roots.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));

    roots
        .into_iter()
        .map(|c| build_node(c, &children, depth))
        .collect()
}

fn build_node(
    c: &CommentWithAuthor,
    children: &HashMap<Uuid, Vec<&CommentWithAuthor>>,
    remaining: usize,
) -> CommentNode {
    let mut node = CommentNode::leaf(c);
    if remaining > 0 {
        if let Some(replies) = children.get(&c.comment.id) {
            node.replies = replies
                .iter()
                .map(|r| build_node(r, children, remaining - 1))
                .collect();
        }
    }
    node
}

pub async fn load_thread(st: &AppState, post_id: Uuid) -> AppResult<Vec<CommentNode>> {
    let comments = st.comments.list_for_post(post_id).await?;
    Ok(assemble_thread(&comments, st.config.feed.reply_depth))
}

pub async fn create_comment(
    st: &AppState,
    caller: Option<Uuid>,
    req: CreateCommentRequest,
) -> AppResult<CommentNode> {
    let author_id = require_caller(caller)?;
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Comment cannot be empty"));
    }

    match st.posts.find_by_id(req.post_id).await? {
        Some(post) if post.published => {}
        _ => return Err(AppError::not_found("Post")),
    }

    if let Some(parent_id) = req.parent_id {
        let parent = st
            .comments
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::not_found("Parent comment"))?;
        if parent.post_id != req.post_id {
            return Err(AppError::validation(
                "Parent comment belongs to a different post",
            ));
        }
    }

    let created = st
        .comments
        .create(NewComment {
            content,
            post_id: req.post_id,
            author_id,
            parent_id: req.parent_id,
        })
        .await?;
    info!(comment_id = %created.comment.id, post_id = %req.post_id, %author_id, "comment created");
    Ok(CommentNode::leaf(&created))
}

/// Allowed for the comment's author and for the author of the post it is on.
pub async fn delete_comment(st: &AppState, caller: Option<Uuid>, id: Uuid) -> AppResult<()> {
    let caller = require_caller(caller)?;
    let comment = st
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;

    if comment.author_id != caller {
        let post_author = st.posts.find_by_id(comment.post_id).await?.map(|p| p.author_id);
        if post_author != Some(caller) {
            return Err(AppError::Forbidden);
        }
    }

    if !st.comments.delete(id).await? {
        return Err(AppError::not_found("Comment"));
    }
    info!(comment_id = %id, by = %caller, "comment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::repo_types::Comment;
    use crate::memory::{seed_comment, seed_post, seed_user};
    use crate::users::repo_types::Author;
    use time::{Duration, OffsetDateTime};

    fn comment(id: u128, parent: Option<u128>, minute: i64) -> CommentWithAuthor {
        let at = OffsetDateTime::UNIX_EPOCH + Duration::minutes(minute);
        CommentWithAuthor {
            comment: Comment {
                id: Uuid::from_u128(id),
                content: format!("c{id}"),
                created_at: at,
                updated_at: at,
                post_id: Uuid::nil(),
                author_id: Uuid::nil(),
                parent_id: parent.map(Uuid::from_u128),
            },
            author: Author {
                id: Uuid::nil(),
                name: "Ada".into(),
                image: None,
            },
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<u128> {
        nodes.iter().map(|n| n.id.as_u128()).collect()
    }

    #[test]
    fn top_level_newest_first_replies_in_storage_order() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, None, 2),
            comment(4, Some(1), 3),
            comment(5, Some(3), 4),
        ];
        let thread = assemble_thread(&comments, DEFAULT_REPLY_DEPTH);
        assert_eq!(ids(&thread), vec![3, 1]);
        assert_eq!(ids(&thread[0].replies), vec![5]);
        assert_eq!(ids(&thread[1].replies), vec![2, 4]);
    }

    #[test]
    fn replies_of_replies_are_not_materialized() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
        ];
        let thread = assemble_thread(&comments, DEFAULT_REPLY_DEPTH);
        assert_eq!(thread.len(), 1);
        assert_eq!(ids(&thread[0].replies), vec![2]);
        assert!(thread[0].replies[0].replies.is_empty());

        let deeper = assemble_thread(&comments, 2);
        assert_eq!(ids(&deeper[0].replies[0].replies), vec![3]);

        let flat = assemble_thread(&comments, 0);
        assert!(flat[0].replies.is_empty());
    }

    #[test]
    fn empty_input_gives_empty_thread() {
        assert!(assemble_thread(&[], DEFAULT_REPLY_DEPTH).is_empty());
    }

    fn req(post_id: Uuid, parent_id: Option<Uuid>, content: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            content: content.into(),
            post_id,
            parent_id,
        }
    }

    #[tokio::test]
    async fn create_requires_session_and_content() {
        let st = AppState::fake();
        let ada = seed_user(&st, "Ada").await;
        let post = seed_post(&st, &ada, "Hello", "world", true).await;

        assert!(matches!(
            create_comment(&st, None, req(post.id, None, "hi")).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            create_comment(&st, Some(ada.id), req(post.id, None, "   ")).await,
            Err(AppError::Validation(_))
        ));

        let node = create_comment(&st, Some(ada.id), req(post.id, None, "  hi  "))
            .await
            .unwrap();
        assert_eq!(node.content, "hi");
        assert_eq!(node.author.id, ada.id);
    }

    #[tokio::test]
    async fn create_rejects_missing_or_draft_posts() {
        let st = AppState::fake();
        let ada = seed_user(&st, "Ada").await;
        let draft = seed_post(&st, &ada, "Draft", "body", false).await;

        assert!(matches!(
            create_comment(&st, Some(ada.id), req(draft.id, None, "hi")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            create_comment(&st, Some(ada.id), req(Uuid::new_v4(), None, "hi")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reply_parent_must_be_on_the_same_post() {
        let st = AppState::fake();
        let ada = seed_user(&st, "Ada").await;
        let first = seed_post(&st, &ada, "First", "body", true).await;
        let second = seed_post(&st, &ada, "Second", "body", true).await;
        let on_first = seed_comment(&st, &ada, &first, None, "top").await;

        assert!(matches!(
            create_comment(&st, Some(ada.id), req(second.id, Some(on_first.id), "graft")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create_comment(&st, Some(ada.id), req(first.id, Some(Uuid::new_v4()), "x")).await,
            Err(AppError::NotFound(_))
        ));

        let reply = create_comment(&st, Some(ada.id), req(first.id, Some(on_first.id), "ok"))
            .await
            .unwrap();
        assert_eq!(reply.parent_id, Some(on_first.id));

        let thread = load_thread(&st, first.id).await.unwrap();
        assert_eq!(thread[0].replies[0].id, reply.id);
        assert!(load_thread(&st, second.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_allowed_for_comment_author_and_post_author() {
        let st = AppState::fake();
        let ada = seed_user(&st, "Ada").await;
        let bob = seed_user(&st, "Bob").await;
        let eve = seed_user(&st, "Eve").await;
        let post = seed_post(&st, &ada, "Hello", "world", true).await;

        let by_bob = seed_comment(&st, &bob, &post, None, "one").await;
        let reply = seed_comment(&st, &eve, &post, Some(by_bob.id), "reply").await;
        let other = seed_comment(&st, &bob, &post, None, "two").await;

        assert!(matches!(
            delete_comment(&st, Some(eve.id), by_bob.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            delete_comment(&st, None, by_bob.id).await,
            Err(AppError::Unauthorized)
        ));

        delete_comment(&st, Some(bob.id), other.id).await.unwrap();
        delete_comment(&st, Some(ada.id), by_bob.id).await.unwrap();

        assert!(st.comments.find_by_id(reply.id).await.unwrap().is_none());
        assert!(load_thread(&st, post.id).await.unwrap().is_empty());
        assert!(matches!(
            delete_comment(&st, Some(ada.id), by_bob.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
