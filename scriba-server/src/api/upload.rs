//! Batch upload endpoint
//!
//! Multipart form: repeated `files` parts plus optional `project_name` and
//! `language_id` fields, handed to the ingestion pipeline in arrival order.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};

use crate::api::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::services::ingest::{IngestOptions, IngestSummary, UploadedFile};
use crate::services::metadata::MetadataEstimator;
use crate::AppState;

/// Upload batches can carry hours of audio; cap the body well above the
/// framework default
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload-batch", post(upload_batch))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn upload_batch(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Json<IngestSummary>> {
    let mut files = Vec::new();
    let mut options = IngestOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("files") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file part: {}", e)))?;
                files.push(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("project_name") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed field: {}", e)))?;
                if !value.is_empty() {
                    options.project_name = Some(value);
                }
            }
            Some("language_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed field: {}", e)))?;
                if !value.is_empty() {
                    options.language_id = Some(value.parse().map_err(|_| {
                        ApiError::BadRequest(format!("Invalid language_id '{}'", value))
                    })?);
                }
            }
            _ => {}
        }
    }

    let estimator = MetadataEstimator::new();
    let summary = crate::services::ingest::ingest(
        &state.db,
        &state.store,
        &estimator,
        state.language_policy,
        &actor,
        &files,
        &options,
    )
    .await?;

    Ok(Json(summary))
}
