//! Bearer token session persistence
//!
//! Tokens are opaque random strings; handlers resolve them to users through
//! this table. Expired rows are ignored on lookup and swept on login.

use chrono::{Duration, Utc};
use scriba_common::auth::generate_token;
use scriba_common::db::models::User;
use scriba_common::Result;
use sqlx::SqlitePool;

/// Issue a new session token for a user
pub async fn create_session(pool: &SqlitePool, user_id: &str, ttl_hours: i64) -> Result<String> {
    let token = generate_token();
    let now = Utc::now();
    let expires_at = now + Duration::hours(ttl_hours);

    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&token)
    .bind(user_id)
    .bind(now.to_rfc3339())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    // Opportunistic sweep keeps the table from accumulating dead rows
    sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(now.to_rfc3339())
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolve a bearer token to its user, if the session is still live
pub async fn get_session_user(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let user_id: Option<String> = sqlx::query_scalar(
        "SELECT user_id FROM sessions WHERE token = ? AND expires_at >= ?",
    )
    .bind(token)
    .bind(Utc::now().to_rfc3339())
    .fetch_optional(pool)
    .await?;

    match user_id {
        Some(user_id) => crate::db::users::get_user_by_id(pool, &user_id).await,
        None => Ok(None),
    }
}

/// Invalidate one token (logout)
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::{create_user, NewUser};
    use scriba_common::db::create_all_tables;
    use scriba_common::db::models::UserRole;

    async fn test_pool_with_user() -> (SqlitePool, User) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_all_tables(&pool).await.unwrap();
        let user = create_user(
            &pool,
            &NewUser {
                username: "alice".to_string(),
                email: None,
                password_hash: "salt$digest".to_string(),
                first_name: None,
                last_name: None,
                profile_image_url: None,
                role: UserRole::Admin,
                is_active: true,
            },
        )
        .await
        .unwrap();
        (pool, user)
    }

    #[tokio::test]
    async fn test_session_roundtrip() {
        let (pool, user) = test_pool_with_user().await;
        let token = create_session(&pool, &user.id, 24).await.unwrap();

        let resolved = get_session_user(&pool, &token).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);

        delete_session(&pool, &token).await.unwrap();
        assert!(get_session_user(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let (pool, user) = test_pool_with_user().await;
        let token = create_session(&pool, &user.id, 24).await.unwrap();

        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
            .bind((Utc::now() - Duration::hours(1)).to_rfc3339())
            .bind(&token)
            .execute(&pool)
            .await
            .unwrap();

        assert!(get_session_user(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let (pool, _user) = test_pool_with_user().await;
        assert!(get_session_user(&pool, "not-a-token").await.unwrap().is_none());
    }
}
