//! Project database operations

use chrono::Utc;
use scriba_common::db::models::{Project, ProjectStatus};
use scriba_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Fields for a new project row; derived counters start at zero
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub original_filename: String,
    pub file_path: String,
    pub sample_rate: i64,
    pub channels: i64,
    pub language_id: i64,
    pub user_id: String,
    pub status: ProjectStatus,
}

/// Patch-style update of caller-editable fields; derived counters are
/// deliberately absent (only the stats aggregator writes those)
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub transcription_context: Option<String>,
    pub domain_type: Option<String>,
}

fn project_from_row(row: &SqliteRow) -> Result<Project> {
    let status_str: String = row.get("status");
    let status = ProjectStatus::parse(&status_str)
        .ok_or_else(|| Error::Internal(format!("Unknown project status '{}'", status_str)))?;

    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        original_filename: row.get("original_filename"),
        file_path: row.get("file_path"),
        duration: row.get("duration"),
        sample_rate: row.get("sample_rate"),
        channels: row.get("channels"),
        language_id: row.get("language_id"),
        user_id: row.get("user_id"),
        status,
        total_segments: row.get("total_segments"),
        transcribed_segments: row.get("transcribed_segments"),
        translated_segments: row.get("translated_segments"),
        transcription_context: row.get("transcription_context"),
        domain_type: row.get("domain_type"),
        created_at: super::parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: super::parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

pub async fn create_project(pool: &SqlitePool, new_project: &NewProject) -> Result<Project> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT INTO projects (name, original_filename, file_path, duration, sample_rate,
                              channels, language_id, user_id, status, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new_project.name)
    .bind(&new_project.original_filename)
    .bind(&new_project.file_path)
    .bind(new_project.sample_rate)
    .bind(new_project.channels)
    .bind(new_project.language_id)
    .bind(&new_project.user_id)
    .bind(new_project.status.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_project(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::Internal("Project vanished after insert".to_string()))
}

pub async fn get_project(pool: &SqlitePool, project_id: i64) -> Result<Option<Project>> {
    let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(project_from_row).transpose()
}

/// List projects newest first, optionally restricted to a language id set
/// (editor visibility). An empty set yields an empty list without querying.
pub async fn list_projects(
    pool: &SqlitePool,
    language_ids: Option<&[i64]>,
) -> Result<Vec<Project>> {
    let rows = match language_ids {
        None => {
            sqlx::query("SELECT * FROM projects ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
        Some([]) => return Ok(Vec::new()),
        Some(ids) => {
            // sqlx has no array binds for SQLite; build the placeholder list
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "SELECT * FROM projects WHERE language_id IN ({}) ORDER BY created_at DESC",
                placeholders
            );
            let mut query = sqlx::query(&sql);
            for id in ids {
                query = query.bind(id);
            }
            query.fetch_all(pool).await?
        }
    };

    rows.iter().map(project_from_row).collect()
}

pub async fn update_project(
    pool: &SqlitePool,
    project_id: i64,
    patch: &ProjectPatch,
) -> Result<Option<Project>> {
    let Some(existing) = get_project(pool, project_id).await? else {
        return Ok(None);
    };

    let name = patch.name.clone().unwrap_or(existing.name);
    let status = patch.status.unwrap_or(existing.status);
    let transcription_context = patch
        .transcription_context
        .clone()
        .or(existing.transcription_context);
    let domain_type = patch.domain_type.clone().or(existing.domain_type);

    sqlx::query(
        r#"
        UPDATE projects
        SET name = ?, status = ?, transcription_context = ?, domain_type = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(status.as_str())
    .bind(&transcription_context)
    .bind(&domain_type)
    .bind(Utc::now().to_rfc3339())
    .bind(project_id)
    .execute(pool)
    .await?;

    get_project(pool, project_id).await
}

/// Record the representative file path (first stored upload of a batch)
pub async fn set_file_path(pool: &SqlitePool, project_id: i64, file_path: &str) -> Result<()> {
    sqlx::query("UPDATE projects SET file_path = ?, updated_at = ? WHERE id = ?")
        .bind(file_path)
        .bind(Utc::now().to_rfc3339())
        .bind(project_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a project with its folders and segments, children first
pub async fn delete_project_cascade(pool: &SqlitePool, project_id: i64) -> Result<bool> {
    if get_project(pool, project_id).await?.is_none() {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM segments WHERE project_id = ?")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM folders WHERE project_id = ?")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(true)
}
