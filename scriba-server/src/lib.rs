//! scriba-server library interface
//!
//! Exposes the application state and router so integration tests can drive
//! the full HTTP surface without a listening socket.

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use scriba_common::config::{DefaultLanguagePolicy, ServerConfig};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::services::storage::BlobStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Durable storage for uploaded file blobs
    pub store: BlobStore,
    /// Language fallback policy for batch ingestion
    pub language_policy: DefaultLanguagePolicy,
    /// Bearer token lifetime
    pub session_ttl_hours: i64,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &ServerConfig) -> Self {
        Self {
            db,
            store: BlobStore::new(config.uploads_dir()),
            language_policy: config.default_language_policy,
            session_ttl_hours: config.session_ttl_hours,
        }
    }
}

/// Build application router
///
/// All entity routes live under /api/v1 behind bearer auth; /health is open.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(api::auth::auth_routes())
        .merge(api::users::user_routes())
        .merge(api::languages::language_routes())
        .merge(api::projects::project_routes())
        .merge(api::folders::folder_routes())
        .merge(api::segments::segment_routes())
        .merge(api::upload::upload_routes());

    Router::new()
        .nest("/api/v1", api)
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
