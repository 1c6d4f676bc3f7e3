use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{FeedQuery, FeedResponse, PostDetail, PostPayload};
use super::repo_types::Post;
use super::services;
use crate::{
    auth::Caller,
    error::AppResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/edit", get(get_post_for_edit))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FeedQuery>,
) -> AppResult<Json<FeedResponse>> {
    Ok(Json(services::feed(&state, q).await?))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<PostDetail>> {
    Ok(Json(services::get_published(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn get_post_for_edit(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Post>> {
    Ok(Json(services::get_for_edit(&state, caller, id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(body): ApiJson<PostPayload>,
) -> AppResult<(StatusCode, HeaderMap, Json<Post>)> {
    let post = services::create_post(&state, caller, body).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/posts/{}", post.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(post)))
}

#[instrument(skip(state, body))]
pub async fn update_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<PostPayload>,
) -> AppResult<Json<Post>> {
    Ok(Json(services::update_post(&state, caller, id, body).await?))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    services::delete_post(&state, caller, id).await?;
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}
