//! User database operations

use chrono::Utc;
use scriba_common::db::models::{User, UserLanguage, UserRole};
use scriba_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Fields for a new user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}

/// Patch-style update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::parse(&role_str)
        .ok_or_else(|| Error::Internal(format!("Unknown user role '{}'", role_str)))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        profile_image_url: row.get("profile_image_url"),
        role,
        is_active: row.get::<i64, _>("is_active") != 0,
        last_login_at: super::parse_opt_timestamp(row.get("last_login_at"))?,
        created_at: super::parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: super::parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, first_name, last_name,
                           profile_image_url, role, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.profile_image_url)
    .bind(new_user.role.as_str())
    .bind(new_user.is_active as i64)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_user_by_id(pool, &id)
        .await?
        .ok_or_else(|| Error::Internal("User vanished after insert".to_string()))
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

/// Login lookup: username first, then email
pub async fn get_user_by_username_or_email(
    pool: &SqlitePool,
    username_or_email: &str,
) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE username = ? OR email = ?")
        .bind(username_or_email)
        .bind(username_or_email)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT * FROM users ORDER BY created_at")
        .fetch_all(pool)
        .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn update_user(
    pool: &SqlitePool,
    user_id: &str,
    patch: &UserPatch,
) -> Result<Option<User>> {
    let Some(existing) = get_user_by_id(pool, user_id).await? else {
        return Ok(None);
    };

    let username = patch.username.clone().unwrap_or(existing.username);
    let email = patch.email.clone().or(existing.email);
    let first_name = patch.first_name.clone().or(existing.first_name);
    let last_name = patch.last_name.clone().or(existing.last_name);
    let profile_image_url = patch.profile_image_url.clone().or(existing.profile_image_url);
    let role = patch.role.unwrap_or(existing.role);
    let is_active = patch.is_active.unwrap_or(existing.is_active);
    let password_hash = patch.password_hash.clone().unwrap_or(existing.password_hash);

    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, first_name = ?, last_name = ?,
            profile_image_url = ?, role = ?, is_active = ?, password_hash = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&username)
    .bind(&email)
    .bind(&first_name)
    .bind(&last_name)
    .bind(&profile_image_url)
    .bind(role.as_str())
    .bind(is_active as i64)
    .bind(&password_hash)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .execute(pool)
    .await?;

    get_user_by_id(pool, user_id).await
}

pub async fn deactivate_user(pool: &SqlitePool, user_id: &str) -> Result<Option<User>> {
    let patch = UserPatch {
        is_active: Some(false),
        ..UserPatch::default()
    };
    update_user(pool, user_id, &patch).await
}

/// Delete a user along with language assignments and active sessions.
///
/// Historical transcribed_by/translated_by attributions on segments are weak
/// references and stay in place.
pub async fn delete_user(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    if get_user_by_id(pool, user_id).await?.is_none() {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_languages WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(true)
}

pub async fn set_last_login(pool: &SqlitePool, user_id: &str) -> Result<()> {
    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Languages assigned to a user, joined with language details
pub async fn get_user_languages(pool: &SqlitePool, user_id: &str) -> Result<Vec<UserLanguage>> {
    let rows = sqlx::query(
        r#"
        SELECT l.id, l.name, l.code
        FROM user_languages ul
        JOIN languages l ON l.id = ul.language_id
        WHERE ul.user_id = ?
        ORDER BY l.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| UserLanguage {
            id: row.get("id"),
            language_name: row.get("name"),
            language_code: row.get("code"),
        })
        .collect())
}

/// Assigned language ids only (access policy input)
pub async fn get_user_language_ids(pool: &SqlitePool, user_id: &str) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT language_id FROM user_languages WHERE user_id = ? ORDER BY language_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Replace a user's language assignments with the given set
pub async fn set_user_languages(
    pool: &SqlitePool,
    user_id: &str,
    language_ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_languages WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    let now = Utc::now().to_rfc3339();
    for language_id in language_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO user_languages (user_id, language_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(language_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Per-user work statistics
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub projects_count: i64,
    pub transcribed_segments_count: i64,
    pub translated_segments_count: i64,
    pub assigned_languages: Vec<UserLanguage>,
}

pub async fn get_user_stats(pool: &SqlitePool, user_id: &str) -> Result<UserStats> {
    let projects_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    let transcribed_segments_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM segments WHERE transcribed_by = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    let translated_segments_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM segments WHERE translated_by = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    let assigned_languages = get_user_languages(pool, user_id).await?;

    Ok(UserStats {
        projects_count,
        transcribed_segments_count,
        translated_segments_count,
        assigned_languages,
    })
}
