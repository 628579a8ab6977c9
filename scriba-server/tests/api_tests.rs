//! Integration tests for the HTTP API
//!
//! Drives the full router with tower's oneshot against an in-memory
//! database: authentication, role/language gating, 404-before-403 ordering,
//! segment update stamping and the multipart upload endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use scriba_common::auth::hash_password;
use scriba_common::config::{ServerConfig, TomlConfig};
use scriba_common::db::create_all_tables;
use scriba_common::db::models::{User, UserRole};
use scriba_server::db::{languages, sessions, users};
use scriba_server::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

struct TestApp {
    app: axum::Router,
    pool: SqlitePool,
    admin: User,
    admin_token: String,
    editor: User,
    editor_token: String,
    language_id: i64,
    _dir: TempDir,
}

async fn setup() -> TestApp {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    create_all_tables(&pool).await.unwrap();

    let language = languages::create_language(&pool, "en", "English").await.unwrap();

    let admin = users::create_user(&pool, &new_user("admin", UserRole::Admin)).await.unwrap();
    let editor = users::create_user(&pool, &new_user("editor", UserRole::Editor)).await.unwrap();

    let admin_token = sessions::create_session(&pool, &admin.id, 24).await.unwrap();
    let editor_token = sessions::create_session(&pool, &editor.id, 24).await.unwrap();

    let dir = TempDir::new().unwrap();
    let root = dir.path().display().to_string();
    let config = ServerConfig::resolve(None, Some(&root), &TomlConfig::default());
    let state = AppState::new(pool.clone(), &config);

    TestApp {
        app: build_router(state),
        pool,
        admin,
        admin_token,
        editor,
        editor_token,
        language_id: language.id,
        _dir: dir,
    }
}

fn new_user(username: &str, role: UserRole) -> users::NewUser {
    users::NewUser {
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        password_hash: hash_password("secret123"),
        first_name: None,
        last_name: None,
        profile_image_url: None,
        role,
        is_active: true,
    }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(value) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Multipart body for /upload-batch with the given files and fields
fn multipart_request(
    uri: &str,
    token: &str,
    files: &[(&str, &[u8])],
    fields: &[(&str, &str)],
) -> Request<Body> {
    let boundary = "scriba-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (filename, bytes) in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Ingest a small batch through the API, returning the new project id
async fn upload_project(test_app: &TestApp) -> i64 {
    let response = test_app
        .app
        .clone()
        .oneshot(multipart_request(
            "/api/v1/upload-batch",
            &test_app.admin_token,
            &[("a.mp3", &[0u8; 2048]), ("notes.txt", b"notes")],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    body["projectId"].as_i64().unwrap()
}

// ============================================================================
// Health and authentication
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let test_app = setup().await;
    let response = test_app
        .app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "scriba-server");
}

#[tokio::test]
async fn test_protected_route_rejects_missing_and_bad_tokens() {
    let test_app = setup().await;

    let response = test_app
        .app
        .clone()
        .oneshot(request("GET", "/api/v1/projects", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = test_app
        .app
        .oneshot(request("GET", "/api/v1/projects", Some("bogus"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_issues_usable_token() {
    let test_app = setup().await;

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "admin", "password": "secret123"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["username"], "admin");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let response = test_app
        .app
        .oneshot(request("GET", "/api/v1/auth/user", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["username"], "admin");
    assert!(body["userLanguages"].is_array());
}

#[tokio::test]
async fn test_login_rejects_bad_password_and_inactive_account() {
    let test_app = setup().await;

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "admin", "password": "wrong"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    users::deactivate_user(&test_app.pool, &test_app.editor.id).await.unwrap();
    let response = test_app
        .app
        .oneshot(request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "editor", "password": "secret123"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Upload and project visibility
// ============================================================================

#[tokio::test]
async fn test_upload_batch_creates_project_with_counters() {
    let test_app = setup().await;

    let response = test_app
        .app
        .clone()
        .oneshot(multipart_request(
            "/api/v1/upload-batch",
            &test_app.admin_token,
            &[("a.mp3", &[0u8; 2048]), ("b.mp3", &[0u8; 2048]), ("notes.txt", b"n")],
            &[("project_name", "Board meeting")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filesReceived"], 3);
    assert_eq!(body["audioFiles"], 2);
    assert_eq!(body["segmentsCreated"], 3);

    let project_id = body["projectId"].as_i64().unwrap();
    let response = test_app
        .app
        .oneshot(request(
            "GET",
            &format!("/api/v1/projects/{project_id}"),
            Some(&test_app.admin_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let project = json_body(response).await;
    assert_eq!(project["name"], "Board meeting");
    assert_eq!(project["totalSegments"], 3);
    assert_eq!(project["status"], "ready_for_transcription");
}

#[tokio::test]
async fn test_editor_language_gating() {
    let test_app = setup().await;
    let project_id = upload_project(&test_app).await;

    // No assigned languages: empty listing, 403 on direct read
    let response = test_app
        .app
        .clone()
        .oneshot(request("GET", "/api/v1/projects", Some(&test_app.editor_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 0);

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/projects/{project_id}"),
            Some(&test_app.editor_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Matching language assignment opens the project and its children
    users::set_user_languages(&test_app.pool, &test_app.editor.id, &[test_app.language_id])
        .await
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/projects/{project_id}"),
            Some(&test_app.editor_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/segments/project/{project_id}"),
            Some(&test_app.editor_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_not_found_reported_before_permission() {
    let test_app = setup().await;

    // Editor with no language access still sees 404 for a missing project,
    // not 403
    let response = test_app
        .app
        .oneshot(request(
            "GET",
            "/api/v1/projects/9999",
            Some(&test_app.editor_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_editor_cannot_manage_project() {
    let test_app = setup().await;
    let project_id = upload_project(&test_app).await;
    users::set_user_languages(&test_app.pool, &test_app.editor.id, &[test_app.language_id])
        .await
        .unwrap();

    // Lifecycle patch denied
    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/projects/{project_id}"),
            Some(&test_app.editor_token),
            Some(json!({"status": "completed"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Delete denied
    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/projects/{project_id}"),
            Some(&test_app.editor_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin can do both
    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/projects/{project_id}"),
            Some(&test_app.admin_token),
            Some(json!({"status": "completed"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "completed");

    let response = test_app
        .app
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/projects/{project_id}"),
            Some(&test_app.admin_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Segment workflow over HTTP
// ============================================================================

#[tokio::test]
async fn test_segment_patch_stamps_transcriber() {
    let test_app = setup().await;
    let project_id = upload_project(&test_app).await;
    users::set_user_languages(&test_app.pool, &test_app.editor.id, &[test_app.language_id])
        .await
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/segments/project/{project_id}"),
            Some(&test_app.editor_token),
            None,
        ))
        .await
        .unwrap();
    let segments = json_body(response).await;
    let segment_id = segments[0]["id"].as_i64().unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/segments/{segment_id}"),
            Some(&test_app.editor_token),
            Some(json!({"transcription": "hello there", "isTranscribed": true})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["isTranscribed"], true);
    assert_eq!(updated["transcribedBy"], test_app.editor.id.as_str());
    assert!(updated["transcribedAt"].is_string());

    // Counters recomputed synchronously
    let response = test_app
        .app
        .oneshot(request(
            "GET",
            &format!("/api/v1/projects/{project_id}"),
            Some(&test_app.admin_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["transcribedSegments"], 1);
}

#[tokio::test]
async fn test_editor_cannot_delete_segment() {
    let test_app = setup().await;
    let project_id = upload_project(&test_app).await;
    users::set_user_languages(&test_app.pool, &test_app.editor.id, &[test_app.language_id])
        .await
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/segments/project/{project_id}"),
            Some(&test_app.editor_token),
            None,
        ))
        .await
        .unwrap();
    let segments = json_body(response).await;
    let segment_id = segments[0]["id"].as_i64().unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/segments/{segment_id}"),
            Some(&test_app.editor_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = test_app
        .app
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/segments/{segment_id}"),
            Some(&test_app.admin_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// User administration
// ============================================================================

#[tokio::test]
async fn test_user_creation_conflicts_and_role_gating() {
    let test_app = setup().await;

    // Editors may not list users
    let response = test_app
        .app
        .clone()
        .oneshot(request("GET", "/api/v1/users", Some(&test_app.editor_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin creates a user with language assignments
    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/users",
            Some(&test_app.admin_token),
            Some(json!({
                "username": "fresh",
                "password": "pw12345",
                "role": "editor",
                "languageIds": [test_app.language_id]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["username"], "fresh");
    assert_eq!(body["userLanguages"][0]["id"], test_app.language_id);

    // Duplicate username is a conflict
    let response = test_app
        .app
        .oneshot(request(
            "POST",
            "/api/v1/users",
            Some(&test_app.admin_token),
            Some(json!({"username": "fresh", "password": "pw12345"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_deactivated_user_loses_access() {
    let test_app = setup().await;

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/users/{}/deactivate", test_app.editor.id),
            Some(&test_app.admin_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Existing token no longer works
    let response = test_app
        .app
        .oneshot(request("GET", "/api/v1/projects", Some(&test_app.editor_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_segment_audio_roundtrip() {
    let test_app = setup().await;
    let project_id = upload_project(&test_app).await;

    let response = test_app
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/segments/project/{project_id}"),
            Some(&test_app.admin_token),
            None,
        ))
        .await
        .unwrap();
    let segments = json_body(response).await;
    let segment_id = segments[0]["id"].as_i64().unwrap();

    let response = test_app
        .app
        .oneshot(request(
            "GET",
            &format!("/api/v1/segments/{segment_id}/audio"),
            Some(&test_app.admin_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "audio/mpeg"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.len(), 2048);
}
