//! Folder endpoints
//!
//! Folder access resolves through the parent project: the folder is fetched
//! first (404), then the project's language/role gate applies (403).

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use scriba_common::db::models::Folder;
use serde::Deserialize;

use crate::api::projects::load_project;
use crate::api::{CurrentUser, MessageResponse};
use crate::db::folders::{FolderPatch, NewFolder};
use crate::error::{ApiError, ApiResult};
use crate::services::access::{authorize_project, AccessLevel};
use crate::AppState;

pub fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders/:folder_id", get(get_folder).patch(update_folder).delete(delete_folder))
        .route("/folders/project/:project_id", get(list_project_folders).post(create_folder))
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateFolderRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Fetch a folder or 404
pub(crate) async fn load_folder(state: &AppState, folder_id: i64) -> ApiResult<Folder> {
    crate::db::folders::get_folder(&state.db, folder_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Folder not found".to_string()))
}

async fn get_folder(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(folder_id): Path<i64>,
) -> ApiResult<Json<Folder>> {
    let folder = load_folder(&state, folder_id).await?;
    let project = load_project(&state, folder.project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Read).await?;
    Ok(Json(folder))
}

async fn list_project_folders(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<Folder>>> {
    let project = load_project(&state, project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Read).await?;

    let folders = crate::db::folders::list_folders_by_project(&state.db, project_id).await?;
    Ok(Json(folders))
}

async fn create_folder(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(project_id): Path<i64>,
    Json(request): Json<CreateFolderRequest>,
) -> ApiResult<Json<Folder>> {
    let project = load_project(&state, project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Edit).await?;

    if request.name.is_empty() {
        return Err(ApiError::BadRequest("Folder name is required".to_string()));
    }

    let folder = crate::db::folders::create_folder(
        &state.db,
        &NewFolder {
            project_id,
            name: request.name,
            description: request.description,
        },
    )
    .await?;
    Ok(Json(folder))
}

async fn update_folder(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(folder_id): Path<i64>,
    Json(request): Json<UpdateFolderRequest>,
) -> ApiResult<Json<Folder>> {
    let folder = load_folder(&state, folder_id).await?;
    let project = load_project(&state, folder.project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Edit).await?;

    let patch = FolderPatch {
        name: request.name,
        description: request.description,
    };
    let updated = crate::db::folders::update_folder(&state.db, folder_id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Folder not found".to_string()))?;
    Ok(Json(updated))
}

/// Deleting a folder removes its segments, so it is a Manage-level
/// operation like segment deletion.
async fn delete_folder(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(folder_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let folder = load_folder(&state, folder_id).await?;
    let project = load_project(&state, folder.project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Manage).await?;

    crate::db::folders::delete_folder_cascade(&state.db, folder_id).await?;
    crate::services::stats::recompute(&state.db, folder.project_id).await?;
    Ok(Json(MessageResponse::new("Folder deleted")))
}
