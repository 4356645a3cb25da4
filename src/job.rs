//! Job status snapshots and the structured log entries they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Uploaded,
    Processing,
    Completed,
    Error,
    /// Sentinel returned for unknown job identifiers
    NotFound,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Uploaded => "uploaded",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Error => "error",
            JobState::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Object,
    Dialog,
    CommonEvent,
    /// String left untranslated after every attempt failed
    Anomaly,
    /// Whole file skipped because processing it failed
    Error,
}

impl LogKind {
    /// Kinds whose entries point at a translated string that can be edited
    pub fn is_editable(self) -> bool {
        matches!(self, LogKind::Object | LogKind::Dialog | LogKind::CommonEvent)
    }
}

/// One attempted (or failed) string translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Source file name; left empty by the handlers and filled in by the pipeline
    #[serde(default)]
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LogEntry {
    pub fn translated(
        kind: LogKind,
        path: String,
        index: usize,
        total: usize,
        raw: &str,
        translated: &str,
    ) -> Self {
        Self {
            kind,
            file: String::new(),
            path: Some(path),
            index: Some(index),
            total: Some(total),
            raw: Some(raw.to_string()),
            translated: Some(translated.to_string()),
            message: None,
        }
    }

    pub fn anomaly(path: String, index: usize, total: usize, raw: &str) -> Self {
        Self {
            kind: LogKind::Anomaly,
            file: String::new(),
            path: Some(path),
            index: Some(index),
            total: Some(total),
            raw: Some(raw.to_string()),
            translated: None,
            message: None,
        }
    }

    pub fn file_error(file: &str, message: String) -> Self {
        Self {
            kind: LogKind::Error,
            file: file.to_string(),
            path: None,
            index: None,
            total: None,
            raw: None,
            translated: None,
            message: Some(message),
        }
    }
}

/// Point-in-time view of a job, as returned to status pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub total_files: usize,
    #[serde(default)]
    pub current_file: usize,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub total_translations: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_filename: Option<String>,
    /// Stamped by the status store on every write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub fn new(status: JobState) -> Self {
        Self {
            status,
            original_filename: None,
            message: None,
            total_files: 0,
            current_file: 0,
            logs: Vec::new(),
            total_translations: 0,
            download_url: None,
            zip_filename: None,
            timestamp: None,
        }
    }

    pub fn not_found() -> Self {
        Self::new(JobState::NotFound)
    }

    pub fn uploaded(original_filename: &str) -> Self {
        Self {
            original_filename: Some(original_filename.to_string()),
            message: Some("File uploaded successfully, ready to translate.".to_string()),
            ..Self::new(JobState::Uploaded)
        }
    }

    pub fn processing(
        original_filename: Option<String>,
        total_files: usize,
        current_file: usize,
        logs: Vec<LogEntry>,
    ) -> Self {
        Self {
            original_filename,
            total_files,
            current_file,
            logs,
            ..Self::new(JobState::Processing)
        }
    }

    pub fn failed(original_filename: Option<String>, message: impl Into<String>) -> Self {
        Self {
            original_filename,
            message: Some(message.into()),
            ..Self::new(JobState::Error)
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobState::Completed
    }
}

pub fn download_url(job_id: &str) -> String {
    format!("/api/download/{}", job_id)
}
