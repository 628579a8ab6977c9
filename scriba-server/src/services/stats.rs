//! Derived project statistics
//!
//! Project counters (segment counts, duration) are a pure function of the
//! live segment rows. They are recomputed synchronously after ingestion and
//! after every segment mutation or deletion, never hand-edited; callers read
//! consistent counters immediately after any write.

use scriba_common::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Recomputed aggregate counters for one project
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_segments: i64,
    pub transcribed_segments: i64,
    pub translated_segments: i64,
    /// Seconds
    pub duration: f64,
}

/// Recompute a project's counters from its segments and persist them.
///
/// Idempotent: repeated calls without intervening segment mutations yield
/// identical counters. A segment counts as transcribed when its flag is set
/// or its transcription text is non-blank (legacy rows lack the flag);
/// translation is analogous.
pub async fn recompute(pool: &SqlitePool, project_id: i64) -> Result<ProjectStats> {
    if crate::db::projects::get_project(pool, project_id).await?.is_none() {
        return Err(Error::NotFound(format!("Project {} not found", project_id)));
    }

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total_segments,
            COALESCE(SUM(duration), 0.0) AS duration,
            COALESCE(SUM(CASE WHEN is_transcribed = 1
                               OR (transcription IS NOT NULL AND TRIM(transcription) <> '')
                              THEN 1 ELSE 0 END), 0) AS transcribed_segments,
            COALESCE(SUM(CASE WHEN is_translated = 1
                               OR (translation IS NOT NULL AND TRIM(translation) <> '')
                              THEN 1 ELSE 0 END), 0) AS translated_segments
        FROM segments
        WHERE project_id = ?
        "#,
    )
    .bind(project_id)
    .fetch_one(pool)
    .await?;

    let stats = ProjectStats {
        total_segments: row.get("total_segments"),
        transcribed_segments: row.get("transcribed_segments"),
        translated_segments: row.get("translated_segments"),
        duration: row.get("duration"),
    };

    sqlx::query(
        r#"
        UPDATE projects
        SET total_segments = ?, transcribed_segments = ?, translated_segments = ?,
            duration = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(stats.total_segments)
    .bind(stats.transcribed_segments)
    .bind(stats.translated_segments)
    .bind(stats.duration)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(project_id)
    .execute(pool)
    .await?;

    tracing::debug!(
        project_id,
        total = stats.total_segments,
        transcribed = stats.transcribed_segments,
        translated = stats.translated_segments,
        duration_s = stats.duration,
        "Recomputed project stats"
    );

    Ok(stats)
}
