use tracing::debug;
use uuid::Uuid;

use super::dto::ProfileResponse;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Public profile: published posts only, counts over everything authored.
pub async fn get_profile(st: &AppState, id: Uuid) -> AppResult<ProfileResponse> {
    let user = st
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let posts = st.posts.list_published_by_author(id).await?;
    let count = st.users.activity_counts(id).await?;
    debug!(user_id = %id, published = posts.len(), "profile loaded");

    Ok(ProfileResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        image: user.image,
        bio: user.bio,
        created_at: user.created_at,
        posts,
        count,
    })
}
