//! API handlers and routing

pub mod auth;
pub mod folders;
pub mod health;
pub mod languages;
pub mod projects;
pub mod segments;
pub mod upload;
pub mod users;

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use scriba_common::db::models::User;
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

/// Simple confirmation payload for mutations without a richer result
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Authenticated actor, resolved from the bearer token.
///
/// Token contents are opaque; the session table maps them to users. Unknown
/// or expired tokens and inactive users are rejected with 401 before any
/// handler runs.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let user = crate::db::sessions::get_session_user(&state.db, &token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        if !user.is_active {
            return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
        }

        Ok(CurrentUser(user))
    }
}

/// Extract the token from an `Authorization: Bearer ...` header
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}
