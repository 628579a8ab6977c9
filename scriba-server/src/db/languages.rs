//! Language database operations

use chrono::Utc;
use scriba_common::db::models::Language;
use scriba_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn language_from_row(row: &SqliteRow) -> Result<Language> {
    Ok(Language {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: super::parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

pub async fn create_language(pool: &SqlitePool, code: &str, name: &str) -> Result<Language> {
    let result = sqlx::query(
        "INSERT INTO languages (code, name, is_active, created_at) VALUES (?, ?, 1, ?)",
    )
    .bind(code)
    .bind(name)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    get_language(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::Internal("Language vanished after insert".to_string()))
}

pub async fn get_language(pool: &SqlitePool, language_id: i64) -> Result<Option<Language>> {
    let row = sqlx::query("SELECT * FROM languages WHERE id = ?")
        .bind(language_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(language_from_row).transpose()
}

pub async fn list_active_languages(pool: &SqlitePool) -> Result<Vec<Language>> {
    let rows = sqlx::query("SELECT * FROM languages WHERE is_active = 1 ORDER BY id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(language_from_row).collect()
}

/// Lowest-id active language, the ingestion fallback under the
/// first-active default language policy
pub async fn first_active_language(pool: &SqlitePool) -> Result<Option<Language>> {
    let row = sqlx::query("SELECT * FROM languages WHERE is_active = 1 ORDER BY id LIMIT 1")
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(language_from_row).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriba_common::db::create_all_tables;

    #[tokio::test]
    async fn test_create_list_and_first_active() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_all_tables(&pool).await.unwrap();

        assert!(first_active_language(&pool).await.unwrap().is_none());

        let en = create_language(&pool, "en", "English").await.unwrap();
        let fi = create_language(&pool, "fi", "Finnish").await.unwrap();

        let listed = list_active_languages(&pool).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].code, "en");

        let first = first_active_language(&pool).await.unwrap().unwrap();
        assert_eq!(first.id, en.id);
        assert_ne!(first.id, fi.id);
    }

    #[tokio::test]
    async fn test_inactive_languages_excluded() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_all_tables(&pool).await.unwrap();

        let en = create_language(&pool, "en", "English").await.unwrap();
        sqlx::query("UPDATE languages SET is_active = 0 WHERE id = ?")
            .bind(en.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(list_active_languages(&pool).await.unwrap().is_empty());
        assert!(first_active_language(&pool).await.unwrap().is_none());
    }
}
