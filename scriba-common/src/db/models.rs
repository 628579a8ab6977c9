//! Entity models
//!
//! Wire field names are camelCase (serde rename) while SQLite columns stay
//! snake_case; the mapping is total in both directions for every persisted
//! field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User role, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Editor,
    Manager,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Editor => "editor",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "editor" => Some(UserRole::Editor),
            "manager" => Some(UserRole::Manager),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Admins and managers see every project regardless of language
    pub fn is_privileged(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Processing,
    ReadyForTranscription,
    InTranscription,
    Completed,
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Processing => "processing",
            ProjectStatus::ReadyForTranscription => "ready_for_transcription",
            ProjectStatus::InTranscription => "in_transcription",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(ProjectStatus::Processing),
            "ready_for_transcription" => Some(ProjectStatus::ReadyForTranscription),
            "in_transcription" => Some(ProjectStatus::InTranscription),
            "completed" => Some(ProjectStatus::Completed),
            "failed" => Some(ProjectStatus::Failed),
            _ => None,
        }
    }
}

/// How a segment's timing metadata was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    /// Timing read (or estimated) from actual audio content
    AudioAnalysis,
    /// Non-audio upload given a fixed nominal timeline
    FileUpload,
    Basic,
}

impl ProcessingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMethod::AudioAnalysis => "audio_analysis",
            ProcessingMethod::FileUpload => "file_upload",
            ProcessingMethod::Basic => "basic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio_analysis" => Some(ProcessingMethod::AudioAnalysis),
            "file_upload" => Some(ProcessingMethod::FileUpload),
            "basic" => Some(ProcessingMethod::Basic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub original_filename: String,
    pub file_path: String,
    /// Derived: sum of segment durations, seconds
    pub duration: f64,
    pub sample_rate: i64,
    pub channels: i64,
    pub language_id: i64,
    pub user_id: String,
    pub status: ProjectStatus,
    /// Derived counters, written only by the stats aggregator
    pub total_segments: i64,
    pub transcribed_segments: i64,
    pub translated_segments: i64,
    pub transcription_context: Option<String>,
    pub domain_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: i64,
    pub folder_id: i64,
    pub project_id: i64,
    pub original_filename: String,
    pub file_path: String,
    /// Seconds
    pub duration: f64,
    /// 1-based, strictly increasing in ingestion order within a project
    pub segment_number: i64,
    pub start_time: f64,
    pub end_time: f64,
    /// 0-1 certainty that the derived timing metadata is accurate
    pub confidence: f64,
    pub processing_method: ProcessingMethod,
    pub transcription: Option<String>,
    pub translation: Option<String>,
    pub is_transcribed: bool,
    pub is_translated: bool,
    pub is_approved: Option<bool>,
    pub genre: Option<String>,
    /// Weak user references: attribution survives user deletion
    pub transcribed_by: Option<String>,
    pub translated_by: Option<String>,
    pub transcribed_at: Option<DateTime<Utc>>,
    pub translated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's language assignment joined with language details
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLanguage {
    pub id: i64,
    pub language_name: String,
    pub language_code: String,
}
