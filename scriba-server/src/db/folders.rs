//! Folder database operations

use chrono::Utc;
use scriba_common::db::models::Folder;
use scriba_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

#[derive(Debug, Clone)]
pub struct NewFolder {
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FolderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn folder_from_row(row: &SqliteRow) -> Result<Folder> {
    Ok(Folder {
        id: row.get("id"),
        project_id: row.get("project_id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: super::parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: super::parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

pub async fn create_folder(pool: &SqlitePool, new_folder: &NewFolder) -> Result<Folder> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO folders (project_id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(new_folder.project_id)
    .bind(&new_folder.name)
    .bind(&new_folder.description)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_folder(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::Internal("Folder vanished after insert".to_string()))
}

pub async fn get_folder(pool: &SqlitePool, folder_id: i64) -> Result<Option<Folder>> {
    let row = sqlx::query("SELECT * FROM folders WHERE id = ?")
        .bind(folder_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(folder_from_row).transpose()
}

/// Folders of a project in creation order
pub async fn list_folders_by_project(pool: &SqlitePool, project_id: i64) -> Result<Vec<Folder>> {
    let rows = sqlx::query("SELECT * FROM folders WHERE project_id = ? ORDER BY created_at")
        .bind(project_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(folder_from_row).collect()
}

pub async fn update_folder(
    pool: &SqlitePool,
    folder_id: i64,
    patch: &FolderPatch,
) -> Result<Option<Folder>> {
    let Some(existing) = get_folder(pool, folder_id).await? else {
        return Ok(None);
    };

    let name = patch.name.clone().unwrap_or(existing.name);
    let description = patch.description.clone().or(existing.description);

    sqlx::query("UPDATE folders SET name = ?, description = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&description)
        .bind(Utc::now().to_rfc3339())
        .bind(folder_id)
        .execute(pool)
        .await?;

    get_folder(pool, folder_id).await
}

/// Delete a folder together with its segments
pub async fn delete_folder_cascade(pool: &SqlitePool, folder_id: i64) -> Result<bool> {
    if get_folder(pool, folder_id).await?.is_none() {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM segments WHERE folder_id = ?")
        .bind(folder_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM folders WHERE id = ?")
        .bind(folder_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(true)
}
