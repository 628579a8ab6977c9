//! Batch ingestion pipeline
//!
//! Turns an ordered batch of uploaded files into one project, one folder and
//! N segments. Segment numbering is a strict function of input order. Files
//! degrade gracefully: audio with unreadable metadata still becomes a timed
//! segment (see the estimator's fallback chain), non-audio files get a fixed
//! nominal timeline, and a storage failure skips only the affected file.

use scriba_common::config::DefaultLanguagePolicy;
use scriba_common::db::models::{ProcessingMethod, ProjectStatus, User};
use scriba_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::folders::NewFolder;
use crate::db::projects::NewProject;
use crate::db::segments::NewSegment;
use crate::services::metadata::MetadataEstimator;
use crate::services::storage::BlobStore;

/// Nominal duration for non-audio uploads, seconds
const NON_AUDIO_SLOT_SECONDS: f64 = 10.0;

/// One uploaded file, in batch order
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Caller-supplied batch options
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub project_name: Option<String>,
    pub language_id: Option<i64>,
}

/// Outcome of one ingestion batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    /// Absent when the batch was empty (no-op success)
    pub project_id: Option<i64>,
    pub folder_id: Option<i64>,
    pub files_received: usize,
    pub audio_files: usize,
    pub segments_created: i64,
    /// Declared filenames whose storage write failed; those files were
    /// skipped, the rest of the batch proceeded
    pub skipped_files: Vec<String>,
    pub message: String,
}

/// Ingest a batch of uploaded files for `actor`.
///
/// Exactly one project and one folder are created per non-empty batch; each
/// file becomes one segment numbered 1..N in input order. Finishes with a
/// synchronous stats recompute so project counters are current on return.
pub async fn ingest(
    pool: &SqlitePool,
    store: &BlobStore,
    estimator: &MetadataEstimator,
    language_policy: DefaultLanguagePolicy,
    actor: &User,
    files: &[UploadedFile],
    options: &IngestOptions,
) -> Result<IngestSummary> {
    if files.is_empty() {
        return Ok(IngestSummary {
            project_id: None,
            folder_id: None,
            files_received: 0,
            audio_files: 0,
            segments_created: 0,
            skipped_files: Vec::new(),
            message: "No files provided".to_string(),
        });
    }

    let language_id = resolve_language(pool, language_policy, options.language_id).await?;

    let first_filename = files
        .iter()
        .map(|f| f.filename.as_str())
        .find(|name| !name.is_empty());
    let project_name = options
        .project_name
        .clone()
        .unwrap_or_else(|| format!("Project from {}", first_filename.unwrap_or("Unknown")));

    let project = crate::db::projects::create_project(
        pool,
        &NewProject {
            name: project_name.clone(),
            original_filename: first_filename.unwrap_or("batch_upload").to_string(),
            file_path: String::new(),
            sample_rate: 44100,
            channels: 2,
            language_id,
            user_id: actor.id.clone(),
            status: ProjectStatus::ReadyForTranscription,
        },
    )
    .await?;

    let folder = crate::db::folders::create_folder(
        pool,
        &NewFolder {
            project_id: project.id,
            name: "Main Folder".to_string(),
            description: Some(format!("Default folder for {}", project_name)),
        },
    )
    .await?;

    let mut segments_created: i64 = 0;
    let mut audio_files = 0usize;
    let mut skipped_files = Vec::new();
    let mut representative_path_set = false;

    for file in files {
        if file.filename.is_empty() {
            continue;
        }

        let stored_path = match store.store(&file.filename, &file.bytes) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(
                    file = %file.filename,
                    error = %e,
                    "Storage write failed, skipping file"
                );
                skipped_files.push(file.filename.clone());
                continue;
            }
        };
        let stored_path_str = stored_path.to_string_lossy().to_string();

        // First successfully stored file represents the project for display
        if !representative_path_set {
            crate::db::projects::set_file_path(pool, project.id, &stored_path_str).await?;
            representative_path_set = true;
        }

        let probe = estimator.estimate(&stored_path, &file.filename);

        let new_segment = if probe.is_audio {
            audio_files += 1;
            NewSegment {
                folder_id: folder.id,
                project_id: project.id,
                original_filename: file.filename.clone(),
                file_path: stored_path_str,
                duration: probe.duration,
                segment_number: segments_created + 1,
                start_time: 0.0,
                end_time: probe.duration,
                confidence: 0.9,
                processing_method: ProcessingMethod::AudioAnalysis,
            }
        } else {
            // Back-to-back synthetic slots keep non-audio timelines disjoint
            let slot = segments_created as f64;
            NewSegment {
                folder_id: folder.id,
                project_id: project.id,
                original_filename: file.filename.clone(),
                file_path: stored_path_str,
                duration: NON_AUDIO_SLOT_SECONDS,
                segment_number: segments_created + 1,
                start_time: slot * NON_AUDIO_SLOT_SECONDS,
                end_time: (slot + 1.0) * NON_AUDIO_SLOT_SECONDS,
                confidence: 0.1,
                processing_method: ProcessingMethod::FileUpload,
            }
        };

        crate::db::segments::create_segment(pool, &new_segment).await?;
        segments_created += 1;
    }

    let stats = crate::services::stats::recompute(pool, project.id).await?;

    tracing::info!(
        project_id = project.id,
        files = files.len(),
        audio_files,
        segments = stats.total_segments,
        duration_s = stats.duration,
        "Ingested upload batch"
    );

    let audio_info = if audio_files > 0 {
        format!(" ({} audio files)", audio_files)
    } else {
        String::new()
    };

    Ok(IngestSummary {
        project_id: Some(project.id),
        folder_id: Some(folder.id),
        files_received: files.len(),
        audio_files,
        segments_created,
        skipped_files,
        message: format!(
            "Successfully uploaded {} files{} into 1 project with 1 folder containing {} segments",
            files.len(),
            audio_info,
            segments_created
        ),
    })
}

/// Resolve the batch's language per the configured policy
async fn resolve_language(
    pool: &SqlitePool,
    policy: DefaultLanguagePolicy,
    requested: Option<i64>,
) -> Result<i64> {
    if let Some(language_id) = requested {
        return match crate::db::languages::get_language(pool, language_id).await? {
            Some(language) => Ok(language.id),
            None => Err(Error::Validation(format!(
                "Unknown language id {}",
                language_id
            ))),
        };
    }

    match policy {
        DefaultLanguagePolicy::FirstActive => {
            match crate::db::languages::first_active_language(pool).await? {
                Some(language) => Ok(language.id),
                None => Err(Error::Validation(
                    "No active language available for default assignment".to_string(),
                )),
            }
        }
        DefaultLanguagePolicy::Require => Err(Error::Validation(
            "language_id is required for uploads".to_string(),
        )),
    }
}
