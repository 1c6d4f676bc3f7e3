//! In-memory repositories and storage used by tests in place of Postgres and S3.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::comments::repo::CommentRepository;
use crate::comments::repo_types::{Comment, CommentWithAuthor, NewComment};
use crate::posts::repo::PostRepository;
use crate::posts::repo_types::{
    summarize, CommentCount, FeedFilter, PageRequest, Post, PostAuthor, PostChanges,
    PostDetailRecord, PostSummary,
};
use crate::storage::StorageClient;
use crate::users::repo::UserRepository;
use crate::users::repo_types::{ActivityCounts, Author, EmailTaken, NewUser, User};

#[derive(Default)]
struct Data {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    last_tick: Option<OffsetDateTime>,
}

impl Data {
    /// Strictly increasing timestamps so ordering never depends on ties.
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let t = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(t);
        t
    }

    fn user(&self, id: Uuid) -> anyhow::Result<&User> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .with_context(|| format!("user {id} missing"))
    }

    fn comment_count(&self, post_id: Uuid) -> i64 {
        self.comments.iter().filter(|c| c.post_id == post_id).count() as i64
    }

    fn summary(&self, p: &Post) -> anyhow::Result<PostSummary> {
        Ok(PostSummary {
            id: p.id,
            title: p.title.clone(),
            excerpt: p.excerpt.clone(),
            summary: summarize(p.excerpt.as_deref(), &p.title),
            image: p.image.clone(),
            category: p.category.clone(),
            published: p.published,
            views: p.views,
            created_at: p.created_at,
            author: Author::from(self.user(p.author_id)?),
            count: CommentCount {
                comments: self.comment_count(p.id),
            },
        })
    }

    fn newest_published(&self, keep: impl Fn(&Post) -> bool) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .iter()
            .filter(|p| p.published && keep(p))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Data>,
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new: NewUser<'_>) -> anyhow::Result<User> {
        let mut data = self.data.write().await;
        if data.users.iter().any(|u| u.email == new.email) {
            return Err(EmailTaken(new.email.to_string()).into());
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name.to_string(),
            email: new.email.to_string(),
            password_hash: new.password_hash.to_string(),
            image: None,
            bio: None,
            created_at: data.tick(),
        };
        data.users.push(user.clone());
        Ok(user)
    }

    async fn activity_counts(&self, id: Uuid) -> anyhow::Result<ActivityCounts> {
        let data = self.data.read().await;
        Ok(ActivityCounts {
            posts: data.posts.iter().filter(|p| p.author_id == id).count() as i64,
            comments: data.comments.iter().filter(|c| c.author_id == id).count() as i64,
        })
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn list_published(
        &self,
        filter: &FeedFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<PostSummary>, i64)> {
        let data = self.data.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let matching = data.newest_published(|p| {
            let search_ok = needle.as_deref().map_or(true, |n| {
                p.title.to_lowercase().contains(n) || p.content.to_lowercase().contains(n)
            });
            let category_ok = filter
                .category
                .as_deref()
                .map_or(true, |c| p.category.as_deref() == Some(c));
            search_ok && category_ok
        });

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|p| data.summary(p))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn list_published_by_author(&self, author_id: Uuid) -> anyhow::Result<Vec<PostSummary>> {
        let data = self.data.read().await;
        data.newest_published(|p| p.author_id == author_id)
            .into_iter()
            .map(|p| data.summary(p))
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let data = self.data.read().await;
        Ok(data.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_published_detail(&self, id: Uuid) -> anyhow::Result<Option<PostDetailRecord>> {
        let data = self.data.read().await;
        let Some(post) = data.posts.iter().find(|p| p.id == id && p.published) else {
            return Ok(None);
        };
        let author = data.user(post.author_id)?;
        Ok(Some(PostDetailRecord {
            author: PostAuthor {
                id: author.id,
                name: author.name.clone(),
                image: author.image.clone(),
                bio: author.bio.clone(),
            },
            comment_count: data.comment_count(post.id),
            post: post.clone(),
        }))
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let mut data = self.data.write().await;
        Ok(data
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.published)
            .map(|p| {
                p.views += 1;
                p.views
            }))
    }

    async fn create(&self, author_id: Uuid, changes: &PostChanges) -> anyhow::Result<Post> {
        let mut data = self.data.write().await;
        data.user(author_id)?;
        let now = data.tick();
        let post = Post {
            id: Uuid::new_v4(),
            title: changes.title.clone(),
            content: changes.content.clone(),
            excerpt: changes.excerpt.clone(),
            image: changes.image.clone(),
            category: changes.category.clone(),
            published: changes.published,
            views: 0,
            created_at: now,
            updated_at: now,
            author_id,
        };
        data.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: Uuid, changes: &PostChanges) -> anyhow::Result<Option<Post>> {
        let mut data = self.data.write().await;
        let now = data.tick();
        Ok(data.posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.title = changes.title.clone();
            p.content = changes.content.clone();
            p.excerpt = changes.excerpt.clone();
            p.image = changes.image.clone();
            p.category = changes.category.clone();
            p.published = changes.published;
            p.updated_at = now;
            p.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut data = self.data.write().await;
        let before = data.posts.len();
        data.posts.retain(|p| p.id != id);
        data.comments.retain(|c| c.post_id != id);
        Ok(data.posts.len() != before)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentWithAuthor>> {
        let data = self.data.read().await;
        let mut comments: Vec<&Comment> = data
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments
            .into_iter()
            .map(|c| {
                Ok(CommentWithAuthor {
                    author: Author::from(data.user(c.author_id)?),
                    comment: c.clone(),
                })
            })
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let data = self.data.read().await;
        Ok(data.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, new: NewComment<'_>) -> anyhow::Result<CommentWithAuthor> {
        let mut data = self.data.write().await;
        let author = Author::from(data.user(new.author_id)?);
        anyhow::ensure!(
            data.posts.iter().any(|p| p.id == new.post_id),
            "post {} missing",
            new.post_id
        );
        let now = data.tick();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: new.content.to_string(),
            created_at: now,
            updated_at: now,
            post_id: new.post_id,
            author_id: new.author_id,
            parent_id: new.parent_id,
        };
        data.comments.push(comment.clone());
        Ok(CommentWithAuthor { comment, author })
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut data = self.data.write().await;
        if !data.comments.iter().any(|c| c.id == id) {
            return Ok(false);
        }
        let mut doomed = HashSet::from([id]);
        loop {
            let more: Vec<Uuid> = data
                .comments
                .iter()
                .filter(|c| c.parent_id.is_some_and(|p| doomed.contains(&p)))
                .map(|c| c.id)
                .filter(|id| !doomed.contains(id))
                .collect();
            if more.is_empty() {
                break;
            }
            doomed.extend(more);
        }
        data.comments.retain(|c| !doomed.contains(&c.id));
        Ok(true)
    }
}

/// Records object keys instead of talking to S3.
#[derive(Default)]
pub struct FakeStorage {
    pub puts: Mutex<Vec<(String, String)>>,
    pub deletes: Mutex<Vec<String>>,
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, _body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string()));
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

pub async fn seed_user(st: &crate::state::AppState, name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase());
    st.users
        .create(NewUser {
            name,
            email: &email,
            password_hash: "not-a-real-hash",
        })
        .await
        .expect("seed user")
}

pub async fn seed_post(
    st: &crate::state::AppState,
    author: &User,
    title: &str,
    content: &str,
    published: bool,
) -> Post {
    st.posts
        .create(
            author.id,
            &PostChanges {
                title: title.into(),
                content: content.into(),
                excerpt: None,
                image: None,
                category: None,
                published,
            },
        )
        .await
        .expect("seed post")
}

pub async fn seed_comment(
    st: &crate::state::AppState,
    author: &User,
    post: &Post,
    parent_id: Option<Uuid>,
    content: &str,
) -> Comment {
    st.comments
        .create(NewComment {
            content,
            post_id: post.id,
            author_id: author.id,
            parent_id,
        })
        .await
        .expect("seed comment")
        .comment
}
