use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use super::services::{store_image, UploadItem};
use crate::{
    auth::{extractors::require_caller, Caller},
    error::{AppError, AppResult},
    state::AppState,
};

// multipart framing on top of the largest accepted file
const BODY_LIMIT_SLACK: usize = 64 * 1024;

pub fn upload_routes(max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_bytes + BODY_LIMIT_SLACK))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /upload (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    Caller(caller): Caller,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let user_id = require_caller(caller)?;
    let mut mp = mp.map_err(|e| AppError::validation(e.body_text()))?;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        let url = store_image(
            &state,
            user_id,
            UploadItem {
                body,
                content_type: &content_type,
            },
        )
        .await?;
        return Ok(Json(UploadResponse { url }));
    }

    Err(AppError::validation("No file uploaded"))
}
