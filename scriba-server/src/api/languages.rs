//! Language endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use scriba_common::db::models::Language;

use crate::api::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn language_routes() -> Router<AppState> {
    Router::new().route("/languages", get(list_languages))
}

/// Active languages, visible to any authenticated user
async fn list_languages(
    State(state): State<AppState>,
    CurrentUser(_actor): CurrentUser,
) -> ApiResult<Json<Vec<Language>>> {
    let languages = crate::db::languages::list_active_languages(&state.db).await?;
    Ok(Json(languages))
}
