//! Segment endpoints

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use scriba_common::db::models::Segment;

use crate::api::folders::load_folder;
use crate::api::projects::load_project;
use crate::api::{CurrentUser, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::services::access::{authorize_project, AccessLevel};
use crate::services::segments::SegmentPatch;
use crate::AppState;

pub fn segment_routes() -> Router<AppState> {
    Router::new()
        .route("/segments/:segment_id", get(get_segment).patch(update_segment).delete(delete_segment))
        .route("/segments/:segment_id/audio", get(segment_audio))
        .route("/segments/project/:project_id", get(list_project_segments))
        .route("/segments/folder/:folder_id", get(list_folder_segments))
}

/// Fetch a segment or 404
async fn load_segment(state: &AppState, segment_id: i64) -> ApiResult<Segment> {
    crate::db::segments::get_segment(&state.db, segment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Segment not found".to_string()))
}

async fn get_segment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(segment_id): Path<i64>,
) -> ApiResult<Json<Segment>> {
    let segment = load_segment(&state, segment_id).await?;
    let project = load_project(&state, segment.project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Read).await?;
    Ok(Json(segment))
}

async fn update_segment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(segment_id): Path<i64>,
    Json(patch): Json<SegmentPatch>,
) -> ApiResult<Json<Segment>> {
    let segment = load_segment(&state, segment_id).await?;
    let project = load_project(&state, segment.project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Edit).await?;

    let updated =
        crate::services::segments::apply_update(&state.db, segment, &patch, &actor.id).await?;
    Ok(Json(updated))
}

async fn list_project_segments(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<Segment>>> {
    let project = load_project(&state, project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Read).await?;

    let segments = crate::db::segments::list_segments_by_project(&state.db, project_id).await?;
    Ok(Json(segments))
}

async fn list_folder_segments(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(folder_id): Path<i64>,
) -> ApiResult<Json<Vec<Segment>>> {
    let folder = load_folder(&state, folder_id).await?;
    let project = load_project(&state, folder.project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Read).await?;

    let segments = crate::db::segments::list_segments_by_folder(&state.db, folder_id).await?;
    Ok(Json(segments))
}

async fn delete_segment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(segment_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let segment = load_segment(&state, segment_id).await?;
    let project = load_project(&state, segment.project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Manage).await?;

    crate::services::segments::delete_with_recompute(&state.db, &segment).await?;
    Ok(Json(MessageResponse::new("Segment deleted")))
}

/// Serve the stored bytes of a segment's file
async fn segment_audio(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(segment_id): Path<i64>,
) -> ApiResult<Response> {
    let segment = load_segment(&state, segment_id).await?;
    let project = load_project(&state, segment.project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Read).await?;

    let path = std::path::Path::new(&segment.file_path);
    if !state.store.exists(path) {
        return Err(ApiError::NotFound("Stored file is missing".to_string()));
    }
    let bytes = state.store.read(path)?;

    let content_type = content_type_for(&segment.original_filename);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        bytes,
    )
        .into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = std::path::Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "wma" => "audio/x-ms-wma",
        "aiff" => "audio/aiff",
        _ => "application/octet-stream",
    }
}
