//! User administration endpoints
//!
//! Listing and per-user stats require manager or admin; all mutations are
//! admin-only.

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use scriba_common::auth::hash_password;
use scriba_common::db::models::UserRole;
use serde::Deserialize;

use crate::api::auth::UserWithLanguages;
use crate::api::{CurrentUser, MessageResponse};
use crate::db::users::{NewUser, UserPatch, UserStats};
use crate::error::{ApiError, ApiResult};
use crate::services::access::require_privileged;
use crate::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:user_id", patch(update_user).delete(delete_user))
        .route("/users/:user_id/deactivate", patch(deactivate_user))
        .route("/users/:user_id/reset-password", post(reset_password))
        .route("/users/:user_id/stats", get(user_stats))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    #[serde(default = "default_role")]
    pub role: UserRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub language_ids: Vec<i64>,
}

fn default_role() -> UserRole {
    UserRole::Editor
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub language_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

fn require_admin(actor: &scriba_common::db::models::User) -> ApiResult<()> {
    if actor.role == UserRole::Admin {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied(
            "Insufficient permissions".to_string(),
        ))
    }
}

async fn with_languages(
    state: &AppState,
    user: scriba_common::db::models::User,
) -> ApiResult<UserWithLanguages> {
    let user_languages = crate::db::users::get_user_languages(&state.db, &user.id).await?;
    Ok(UserWithLanguages {
        user,
        user_languages,
    })
}

async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<UserWithLanguages>>> {
    require_privileged(&actor)?;

    let users = crate::db::users::list_users(&state.db).await?;
    let mut result = Vec::with_capacity(users.len());
    for user in users {
        result.push(with_languages(&state, user).await?);
    }
    Ok(Json(result))
}

async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<Json<UserWithLanguages>> {
    require_admin(&actor)?;

    if request.username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    if request.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if crate::db::users::get_user_by_username(&state.db, &request.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    if let Some(email) = &request.email {
        if crate::db::users::get_user_by_email(&state.db, email).await?.is_some() {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }
    }

    let new_user = NewUser {
        username: request.username,
        email: request.email,
        password_hash: hash_password(&request.password),
        first_name: request.first_name,
        last_name: request.last_name,
        profile_image_url: request.profile_image_url,
        role: request.role,
        is_active: request.is_active,
    };
    let user = crate::db::users::create_user(&state.db, &new_user).await?;

    if !request.language_ids.is_empty() {
        crate::db::users::set_user_languages(&state.db, &user.id, &request.language_ids).await?;
    }

    tracing::info!(user_id = %user.id, username = %user.username, "User created");
    with_languages(&state, user).await.map(Json)
}

async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserWithLanguages>> {
    require_admin(&actor)?;

    if let Some(username) = &request.username {
        let existing = crate::db::users::get_user_by_username(&state.db, username).await?;
        if existing.is_some_and(|u| u.id != user_id) {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }
    }

    let patch = UserPatch {
        username: request.username,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        profile_image_url: request.profile_image_url,
        role: request.role,
        is_active: request.is_active,
        password_hash: request.password.as_deref().map(hash_password),
    };
    let user = crate::db::users::update_user(&state.db, &user_id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Some(language_ids) = &request.language_ids {
        crate::db::users::set_user_languages(&state.db, &user.id, language_ids).await?;
    }

    with_languages(&state, user).await.map(Json)
}

async fn deactivate_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserWithLanguages>> {
    require_admin(&actor)?;

    let user = crate::db::users::deactivate_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    with_languages(&state, user).await.map(Json)
}

async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&actor)?;

    if !crate::db::users::delete_user(&state.db, &user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    Ok(Json(MessageResponse::new("User deleted")))
}

async fn reset_password(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<Json<UserWithLanguages>> {
    require_admin(&actor)?;

    if request.new_password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let patch = UserPatch {
        password_hash: Some(hash_password(&request.new_password)),
        ..Default::default()
    };
    let user = crate::db::users::update_user(&state.db, &user_id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    with_languages(&state, user).await.map(Json)
}

async fn user_stats(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserStats>> {
    require_privileged(&actor)?;

    if crate::db::users::get_user_by_id(&state.db, &user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    let stats = crate::db::users::get_user_stats(&state.db, &user_id).await?;
    Ok(Json(stats))
}
