use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{dto::ProfileResponse, services::get_profile};
use crate::{error::AppResult, extract::ApiPath, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ProfileResponse>> {
    Ok(Json(get_profile(&state, id).await?))
}
