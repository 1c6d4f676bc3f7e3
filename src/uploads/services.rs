use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub struct UploadItem<'a> {
    pub body: Bytes,
    pub content_type: &'a str,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Checks type and size, returning the file extension for the stored key.
pub fn validate_image(item: &UploadItem<'_>, max_bytes: usize) -> AppResult<&'static str> {
    let ext = ext_from_mime(item.content_type).ok_or_else(|| {
        AppError::validation("Invalid file type. Only images (JPEG, PNG, GIF, WebP) are allowed.")
    })?;
    if item.body.is_empty() {
        return Err(AppError::validation("No file uploaded"));
    }
    if item.body.len() > max_bytes {
        return Err(AppError::validation(format!(
            "File size too large. Maximum size is {}MB.",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(ext)
}

pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

/// Object key behind a URL this service handed out, if it is one.
pub fn key_for_url(base: &str, url: &str) -> Option<String> {
    let prefix = format!("{}/", base.trim_end_matches('/'));
    url.strip_prefix(&prefix)
        .filter(|k| k.starts_with("uploads/"))
        .map(str::to_string)
}

pub async fn store_image(st: &AppState, user_id: Uuid, item: UploadItem<'_>) -> AppResult<String> {
    let ext = validate_image(&item, st.config.upload_max_bytes)?;
    let key = format!("uploads/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, item.body, item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    info!(%user_id, key = %key, "image uploaded");
    Ok(public_url(&st.config.storage.public_url, &key))
}

/// Deletes a previously uploaded image. Failures are logged, never returned.
pub async fn release_image(st: &AppState, url: Option<&str>) {
    let Some(key) = url.and_then(|u| key_for_url(&st.config.storage.public_url, u)) else {
        return;
    };
    if let Err(e) = st.storage.delete_object(&key).await {
        warn!(error = %e, key = %key, "failed to delete stored image");
    }
}
