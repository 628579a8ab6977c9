//! Segment database operations

use chrono::Utc;
use scriba_common::db::models::{ProcessingMethod, Segment};
use scriba_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Fields for a new segment row, produced by the ingestion pipeline
#[derive(Debug, Clone)]
pub struct NewSegment {
    pub folder_id: i64,
    pub project_id: i64,
    pub original_filename: String,
    pub file_path: String,
    pub duration: f64,
    pub segment_number: i64,
    pub start_time: f64,
    pub end_time: f64,
    pub confidence: f64,
    pub processing_method: ProcessingMethod,
}

fn segment_from_row(row: &SqliteRow) -> Result<Segment> {
    let method_str: String = row.get("processing_method");
    let processing_method = ProcessingMethod::parse(&method_str)
        .ok_or_else(|| Error::Internal(format!("Unknown processing method '{}'", method_str)))?;

    Ok(Segment {
        id: row.get("id"),
        folder_id: row.get("folder_id"),
        project_id: row.get("project_id"),
        original_filename: row.get("original_filename"),
        file_path: row.get("file_path"),
        duration: row.get("duration"),
        segment_number: row.get("segment_number"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        confidence: row.get("confidence"),
        processing_method,
        transcription: row.get("transcription"),
        translation: row.get("translation"),
        is_transcribed: row.get::<i64, _>("is_transcribed") != 0,
        is_translated: row.get::<i64, _>("is_translated") != 0,
        is_approved: row
            .get::<Option<i64>, _>("is_approved")
            .map(|v| v != 0),
        genre: row.get("genre"),
        transcribed_by: row.get("transcribed_by"),
        translated_by: row.get("translated_by"),
        transcribed_at: super::parse_opt_timestamp(row.get("transcribed_at"))?,
        translated_at: super::parse_opt_timestamp(row.get("translated_at"))?,
        created_at: super::parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: super::parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

pub async fn create_segment(pool: &SqlitePool, new_segment: &NewSegment) -> Result<Segment> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT INTO segments (folder_id, project_id, original_filename, file_path, duration,
                              segment_number, start_time, end_time, confidence,
                              processing_method, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_segment.folder_id)
    .bind(new_segment.project_id)
    .bind(&new_segment.original_filename)
    .bind(&new_segment.file_path)
    .bind(new_segment.duration)
    .bind(new_segment.segment_number)
    .bind(new_segment.start_time)
    .bind(new_segment.end_time)
    .bind(new_segment.confidence)
    .bind(new_segment.processing_method.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_segment(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::Internal("Segment vanished after insert".to_string()))
}

pub async fn get_segment(pool: &SqlitePool, segment_id: i64) -> Result<Option<Segment>> {
    let row = sqlx::query("SELECT * FROM segments WHERE id = ?")
        .bind(segment_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(segment_from_row).transpose()
}

/// Segments of a project in segment_number order
pub async fn list_segments_by_project(pool: &SqlitePool, project_id: i64) -> Result<Vec<Segment>> {
    let rows = sqlx::query("SELECT * FROM segments WHERE project_id = ? ORDER BY segment_number")
        .bind(project_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(segment_from_row).collect()
}

/// Segments of a folder in segment_number order
pub async fn list_segments_by_folder(pool: &SqlitePool, folder_id: i64) -> Result<Vec<Segment>> {
    let rows = sqlx::query("SELECT * FROM segments WHERE folder_id = ? ORDER BY segment_number")
        .bind(folder_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(segment_from_row).collect()
}

/// Persist the mutable fields of a segment back to its row.
///
/// The caller (segment service) owns the patch semantics; this writes the
/// already-merged state.
pub async fn save_segment(pool: &SqlitePool, segment: &Segment) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE segments
        SET transcription = ?, translation = ?, is_transcribed = ?, is_translated = ?,
            is_approved = ?, genre = ?, transcribed_by = ?, translated_by = ?,
            transcribed_at = ?, translated_at = ?, end_time = ?, segment_number = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&segment.transcription)
    .bind(&segment.translation)
    .bind(segment.is_transcribed as i64)
    .bind(segment.is_translated as i64)
    .bind(segment.is_approved.map(|v| v as i64))
    .bind(&segment.genre)
    .bind(&segment.transcribed_by)
    .bind(&segment.translated_by)
    .bind(segment.transcribed_at.map(|t| t.to_rfc3339()))
    .bind(segment.translated_at.map(|t| t.to_rfc3339()))
    .bind(segment.end_time)
    .bind(segment.segment_number)
    .bind(Utc::now().to_rfc3339())
    .bind(segment.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_segment(pool: &SqlitePool, segment_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM segments WHERE id = ?")
        .bind(segment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
