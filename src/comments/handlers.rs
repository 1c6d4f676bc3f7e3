use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CommentNode, CreateCommentRequest};
use super::services::{create_comment, delete_comment};
use crate::{
    auth::Caller,
    error::AppResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", post(create))
        .route("/comments/:id", delete(remove))
}

#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(body): ApiJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentNode>)> {
    let node = create_comment(&state, caller, body).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    delete_comment(&state, caller, id).await?;
    Ok(Json(json!({ "message": "Comment deleted" })))
}
