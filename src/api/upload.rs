//! Upload API endpoints
//!
//! Handles image uploads for tool logos, tool screenshots and article
//! images. Files land under `<upload.path>/<kind>/` and are served back
//! from `/media/<kind>/...`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::path::Path as FsPath;
use tokio::fs;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};

/// Upload folders, one per image field that accepts uploads
pub const UPLOAD_KINDS: &[&str] = &["tool_logos", "tool_images", "article_images"];

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Response for successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Path relative to the media root, as stored in image fields
    pub path: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

/// Build the upload router
pub fn router(max_file_size: u64) -> Router<AppState> {
    let limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/{kind}", post(upload_file))
        .layer(DefaultBodyLimit::max(limit))
}

/// POST /api/uploads/:kind - Upload a single image
///
/// Accepts multipart/form-data with a single file field named "file".
async fn upload_file(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    if !UPLOAD_KINDS.contains(&kind.as_str()) {
        return Err(ApiError::not_found(format!("Unknown upload kind {}", kind)));
    }
    let config = &state.upload_config;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !config.is_type_allowed(&content_type) {
            return Err(ApiError::validation_error(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                content_type, config.allowed_types
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        if data.len() as u64 > config.max_file_size {
            return Err(ApiError::validation_error(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                config.max_file_size,
                config.max_file_size / 1024 / 1024
            )));
        }

        let dir = config.path.join(&kind);
        ensure_upload_dir(&dir).await?;

        let filename = format!("{}.{}", Uuid::new_v4(), config.get_extension(&content_type));
        fs::write(dir.join(&filename), &data).await.map_err(|e| {
            tracing::error!("Failed to save upload: {}", e);
            ApiError::internal_error("Failed to save file")
        })?;

        let path = format!("{}/{}", kind, filename);
        tracing::info!("{} uploaded {} ({} bytes)", user.username, path, data.len());
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: format!("/media/{}", path),
                path,
                size: data.len() as u64,
                content_type,
            }),
        ));
    }

    Err(ApiError::validation_error("No file provided"))
}

/// Ensure upload directory exists
async fn ensure_upload_dir(path: &FsPath) -> Result<(), ApiError> {
    fs::create_dir_all(path).await.map_err(|e| {
        tracing::error!("Failed to create upload dir {}: {}", path.display(), e);
        ApiError::internal_error("Failed to create upload directory")
    })
}
