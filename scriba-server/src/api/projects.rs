//! Project endpoints
//!
//! Listing is filtered by the actor's visible languages; single-project
//! routes resolve the resource first (404) and authorize second (403).

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use scriba_common::db::models::{Project, ProjectStatus};
use serde::Deserialize;

use crate::api::{CurrentUser, MessageResponse};
use crate::db::projects::ProjectPatch;
use crate::error::{ApiError, ApiResult};
use crate::services::access::{authorize_project, visible_language_ids, AccessLevel};
use crate::AppState;

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/:project_id", get(get_project).patch(update_project).delete(delete_project))
        .route("/projects/:project_id/recalculate-stats", post(recalculate_stats))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub transcription_context: Option<String>,
    pub domain_type: Option<String>,
}

/// Fetch a project or 404
pub(crate) async fn load_project(state: &AppState, project_id: i64) -> ApiResult<Project> {
    crate::db::projects::get_project(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<Project>>> {
    let language_ids = visible_language_ids(&state.db, &actor).await?;
    let projects =
        crate::db::projects::list_projects(&state.db, language_ids.as_deref()).await?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Project>> {
    let project = load_project(&state, project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Read).await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(project_id): Path<i64>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project = load_project(&state, project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Manage).await?;

    let patch = ProjectPatch {
        name: request.name,
        status: request.status,
        transcription_context: request.transcription_context,
        domain_type: request.domain_type,
    };
    let updated = crate::db::projects::update_project(&state.db, project_id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    Ok(Json(updated))
}

async fn recalculate_stats(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Project>> {
    let project = load_project(&state, project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Manage).await?;

    crate::services::stats::recompute(&state.db, project_id).await?;
    let refreshed = load_project(&state, project_id).await?;
    Ok(Json(refreshed))
}

async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state, project_id).await?;
    authorize_project(&state.db, &actor, &project, AccessLevel::Manage).await?;

    crate::db::projects::delete_project_cascade(&state.db, project_id).await?;
    tracing::info!(project_id, "Project deleted with folders and segments");
    Ok(Json(MessageResponse::new("Project deleted")))
}
