//! Authentication endpoints
//!
//! Login verifies credentials and issues an opaque bearer token; the token
//! is persisted server-side and resolved back to a user by the CurrentUser
//! extractor. What the token encodes is invisible to every other handler.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use scriba_common::auth::{hash_password, verify_password};
use scriba_common::db::models::{User, UserLanguage};
use serde::{Deserialize, Serialize};

use crate::api::{CurrentUser, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify))
        .route("/auth/logout", post(logout))
        .route("/auth/change-password", post(change_password))
        .route("/auth/user", get(current_user))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenVerificationResponse {
    pub valid: bool,
    pub user: User,
}

/// User payload extended with language assignments
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithLanguages {
    #[serde(flatten)]
    pub user: User,
    pub user_languages: Vec<UserLanguage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = crate::db::users::get_user_by_username_or_email(&state.db, &request.username)
        .await?
        .filter(|user| verify_password(&request.password, &user.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    crate::db::users::set_last_login(&state.db, &user.id).await?;
    let token =
        crate::db::sessions::create_session(&state.db, &user.id, state.session_ttl_hours).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user,
    }))
}

async fn verify(CurrentUser(user): CurrentUser) -> ApiResult<Json<TokenVerificationResponse>> {
    Ok(Json(TokenVerificationResponse { valid: true, user }))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    if let Some(token) = crate::api::bearer_token(&headers) {
        crate::db::sessions::delete_session(&state.db, &token).await?;
    }
    Ok(Json(MessageResponse::new("Logged out")))
}

async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if !verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }
    if request.new_password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let patch = crate::db::users::UserPatch {
        password_hash: Some(hash_password(&request.new_password)),
        ..Default::default()
    };
    crate::db::users::update_user(&state.db, &user.id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MessageResponse::new("Password changed")))
}

async fn current_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UserWithLanguages>> {
    let user_languages = crate::db::users::get_user_languages(&state.db, &user.id).await?;
    Ok(Json(UserWithLanguages {
        user,
        user_languages,
    }))
}
