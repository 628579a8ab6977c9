//! Segment update workflow
//!
//! Transcription and translation are independent one-way latches per axis:
//! a false→true transition stamps the acting user and current time on the
//! matching by/at pair and nothing else. Reverting a flag to false clears
//! only the flag; prior attribution stays in place. Already-true flags are
//! never re-stamped by unrelated edits.
//!
//! Every update ends with a synchronous stats recompute on the parent
//! project, so derived counters are current the moment the call returns.

use chrono::Utc;
use scriba_common::db::models::Segment;
use scriba_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;

/// Patch-style segment update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPatch {
    pub transcription: Option<String>,
    pub translation: Option<String>,
    pub is_transcribed: Option<bool>,
    pub is_translated: Option<bool>,
    pub is_approved: Option<bool>,
    pub genre: Option<String>,
    pub end_time: Option<f64>,
    pub segment_number: Option<i64>,
}

/// Apply a patch to a segment, stamping attribution on flag transitions,
/// then recompute the parent project's counters.
pub async fn apply_update(
    pool: &SqlitePool,
    mut segment: Segment,
    patch: &SegmentPatch,
    actor_id: &str,
) -> Result<Segment> {
    if let Some(end_time) = patch.end_time {
        if end_time < segment.start_time {
            return Err(Error::Validation(format!(
                "end_time {} precedes start_time {}",
                end_time, segment.start_time
            )));
        }
        segment.end_time = end_time;
    }

    if let Some(transcription) = &patch.transcription {
        segment.transcription = Some(transcription.clone());
    }
    if let Some(translation) = &patch.translation {
        segment.translation = Some(translation.clone());
    }
    if let Some(is_approved) = patch.is_approved {
        segment.is_approved = Some(is_approved);
    }
    if let Some(genre) = &patch.genre {
        segment.genre = Some(genre.clone());
    }
    if let Some(segment_number) = patch.segment_number {
        if segment_number < 1 {
            return Err(Error::Validation(
                "segment_number must be 1-based".to_string(),
            ));
        }
        segment.segment_number = segment_number;
    }

    if let Some(is_transcribed) = patch.is_transcribed {
        if is_transcribed && !segment.is_transcribed {
            segment.transcribed_by = Some(actor_id.to_string());
            segment.transcribed_at = Some(Utc::now());
        }
        // Un-marking keeps prior attribution
        segment.is_transcribed = is_transcribed;
    }

    if let Some(is_translated) = patch.is_translated {
        if is_translated && !segment.is_translated {
            segment.translated_by = Some(actor_id.to_string());
            segment.translated_at = Some(Utc::now());
        }
        segment.is_translated = is_translated;
    }

    crate::db::segments::save_segment(pool, &segment).await?;
    crate::services::stats::recompute(pool, segment.project_id).await?;

    crate::db::segments::get_segment(pool, segment.id)
        .await?
        .ok_or_else(|| Error::Internal("Segment vanished during update".to_string()))
}

/// Delete a segment and recompute the parent project's counters
pub async fn delete_with_recompute(pool: &SqlitePool, segment: &Segment) -> Result<()> {
    if !crate::db::segments::delete_segment(pool, segment.id).await? {
        return Err(Error::NotFound(format!("Segment {} not found", segment.id)));
    }
    crate::services::stats::recompute(pool, segment.project_id).await?;
    Ok(())
}
