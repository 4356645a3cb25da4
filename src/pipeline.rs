//! Job orchestration: translate every recognised file of an upload, bundle
//! the result, and apply later manual edits.

use crate::extract::{locate_mut, DocumentKind, TranslateContext};
use crate::job::{self, JobState, JobStatus, LogEntry};
use crate::path::{PathError, PathExpr};
use crate::store::StatusStore;
use crate::translation::TextTranslator;
use crate::workspace::{self, sanitize_filename, Workspace};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const NO_FILES_MESSAGE: &str = "No RPG Maker files found. Please upload a .zip file of your project containing the 'data' folder with .json files, or a single .json file.";

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Translation not yet completed.")]
    NotReady,

    #[error("Invalid edit for {file}: {source}")]
    Path {
        file: String,
        #[source]
        source: PathError,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("Job {0} not found.")]
    NotFound(String),

    #[error("Job {job_id} is already {state} and cannot be started again.")]
    AlreadyStarted { job_id: String, state: JobState },
}

/// A job that has been moved to `processing` and is owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedJob {
    pub job_id: String,
    pub original_filename: Option<String>,
}

/// Result of a successful edit pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub applied: usize,
    pub files: usize,
    pub download_url: String,
}

/// Bundle name for a job: `{target}_{original base name}.zip`.
pub fn bundle_name(target_language: &str, original_filename: Option<&str>) -> String {
    let base = original_filename
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .unwrap_or("project");
    sanitize_filename(&format!("{}_{}.zip", target_language, base))
}

pub struct Pipeline {
    store: Arc<dyn StatusStore>,
    translator: TextTranslator,
    workspace: Workspace,
}

impl Pipeline {
    pub fn new(store: Arc<dyn StatusStore>, translator: TextTranslator, workspace: Workspace) -> Self {
        Self {
            store,
            translator,
            workspace,
        }
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Move an `uploaded` job to `processing`. Any other state is refused
    /// and left untouched.
    pub fn claim(&self, job_id: &str) -> Result<ClaimedJob, StartError> {
        let status = self
            .store
            .transition(job_id, JobState::Uploaded, &|current: &JobStatus| {
                JobStatus::processing(current.original_filename.clone(), 0, 0, Vec::new())
            })
            .map_err(|state| match state {
                JobState::NotFound => StartError::NotFound(job_id.to_string()),
                state => StartError::AlreadyStarted {
                    job_id: job_id.to_string(),
                    state,
                },
            })?;

        Ok(ClaimedJob {
            job_id: job_id.to_string(),
            original_filename: status.original_filename,
        })
    }

    /// Claim and run a job, returning its final snapshot.
    pub async fn start(
        &self,
        job_id: &str,
        target_language: &str,
        source_language: &str,
    ) -> Result<JobStatus, StartError> {
        let job = self.claim(job_id)?;
        Ok(self.execute(&job, target_language, source_language).await)
    }

    /// Run a claimed job to completion. Never fails: any error ends the job
    /// in the `error` state and the final snapshot is returned either way.
    pub async fn execute(&self, job: &ClaimedJob, target_language: &str, source_language: &str) -> JobStatus {
        let job_id = job.job_id.as_str();
        let original_filename = &job.original_filename;
        info!(
            "Starting job {} ({} -> {})",
            job_id, source_language, target_language
        );

        match self
            .run(job_id, target_language, source_language, original_filename)
            .await
        {
            Ok(status) => status,
            Err(e) => {
                error!("Job {} failed: {:#}", job_id, e);
                let status = JobStatus::failed(original_filename.clone(), format!("{:#}", e));
                self.store.put(job_id, status.clone());
                status
            }
        }
    }

    async fn run(
        &self,
        job_id: &str,
        target_language: &str,
        source_language: &str,
        original_filename: &Option<String>,
    ) -> Result<JobStatus> {
        let zip_filename = bundle_name(target_language, original_filename.as_deref());

        let job_dir = self.workspace.job_dir(job_id)?;
        let translated_dir = self.workspace.translated_dir(job_id)?;
        if !job_dir.is_dir() {
            anyhow::bail!("Files not found for job {}", job_id);
        }
        if translated_dir.exists() {
            std::fs::remove_dir_all(&translated_dir)
                .with_context(|| format!("Failed to clear {}", translated_dir.display()))?;
        }
        std::fs::create_dir_all(&translated_dir)
            .with_context(|| format!("Failed to create {}", translated_dir.display()))?;

        let files = workspace::discover_input_files(&job_dir)?;
        if files.is_empty() {
            warn!("Job {}: no translatable files found", job_id);
            let status = JobStatus::failed(original_filename.clone(), NO_FILES_MESSAGE);
            self.store.put(job_id, status.clone());
            return Ok(status);
        }

        let total_files = files.len();
        info!("Job {}: {} file(s) to process", job_id, total_files);

        let ctx = TranslateContext {
            translator: &self.translator,
            source: source_language,
            target: target_language,
        };
        let mut logs: Vec<LogEntry> = Vec::new();
        let mut total_translations = 0;

        for (i, file) in files.iter().enumerate() {
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            self.store.put(
                job_id,
                JobStatus::processing(original_filename.clone(), total_files, i + 1, logs.clone()),
            );

            let Some(kind) = DocumentKind::for_file_name(&file_name) else {
                debug!("Skipping {}", file_name);
                continue;
            };

            match self
                .process_file(file, &job_dir, &translated_dir, kind, &ctx)
                .await
            {
                Ok((entries, translations)) => {
                    info!(
                        "Job {}: {} done, {} string(s) translated",
                        job_id, file_name, translations
                    );
                    logs.extend(entries.into_iter().map(|mut entry| {
                        if entry.file.is_empty() {
                            entry.file = file_name.clone();
                        }
                        entry
                    }));
                    total_translations += translations;
                }
                Err(e) => {
                    error!("Job {}: failed to process {}: {:#}", job_id, file_name, e);
                    logs.push(LogEntry::file_error(
                        &file_name,
                        format!("CRITICAL ERROR processing {}: {:#}", file_name, e),
                    ));
                }
            }

            self.store.put(
                job_id,
                JobStatus::processing(original_filename.clone(), total_files, i + 1, logs.clone()),
            );
        }

        let bundle = job_dir.join(&zip_filename);
        workspace::zip_directory(&translated_dir, &bundle)?;

        let status = JobStatus {
            original_filename: original_filename.clone(),
            total_files,
            current_file: total_files,
            logs,
            total_translations,
            download_url: Some(job::download_url(job_id)),
            zip_filename: Some(zip_filename),
            ..JobStatus::new(JobState::Completed)
        };
        self.store.put(job_id, status.clone());
        info!(
            "Job {} completed: {} translation(s) across {} file(s)",
            job_id, total_translations, total_files
        );

        Ok(status)
    }

    /// Translate one file and write it under `translated/`, mirroring its
    /// path relative to the job directory.
    async fn process_file(
        &self,
        file: &Path,
        job_dir: &Path,
        translated_dir: &Path,
        kind: DocumentKind,
        ctx: &TranslateContext<'_>,
    ) -> Result<(Vec<LogEntry>, usize)> {
        let mut doc = workspace::read_json(file)?;
        let report = kind.translate(&mut doc, ctx).await?;

        let relative = file.strip_prefix(job_dir).with_context(|| {
            format!("{} is outside the job directory", file.display())
        })?;
        workspace::write_json(&translated_dir.join(relative), &doc)?;

        Ok((report.entries, report.translations))
    }

    /// Overwrite translated strings with user-supplied text and rebuild the
    /// bundle.
    ///
    /// Only `object`, `dialog` and `common_event` entries with a path and a
    /// translation are applied; edits naming a file that is not in the
    /// translated output are skipped. An unresolvable path aborts the whole
    /// pass before anything is written.
    pub fn apply_edits(&self, job_id: &str, edits: &[LogEntry]) -> Result<EditOutcome, EditError> {
        let mut status = self.store.get(job_id);
        if !status.is_completed() {
            return Err(EditError::NotReady);
        }

        let mut documents: HashMap<String, (PathBuf, Value)> = HashMap::new();
        let mut applied: HashMap<(String, String), String> = HashMap::new();

        for edit in edits {
            if !edit.kind.is_editable() {
                continue;
            }
            let (Some(path), Some(text)) = (edit.path.as_deref(), edit.translated.as_deref()) else {
                continue;
            };

            if !documents.contains_key(&edit.file) {
                match self.workspace.find_translated(job_id, &edit.file)? {
                    Some(file) => {
                        let doc = workspace::read_json(&file)?;
                        documents.insert(edit.file.clone(), (file, doc));
                    }
                    None => {
                        warn!("Job {}: edit for unknown file '{}' skipped", job_id, edit.file);
                        continue;
                    }
                }
            }
            let Some((_, doc)) = documents.get_mut(&edit.file) else {
                continue;
            };

            let to_path_error = |source: PathError| EditError::Path {
                file: edit.file.clone(),
                source,
            };
            let expr: PathExpr = path.parse().map_err(to_path_error)?;
            *locate_mut(doc, &expr).map_err(to_path_error)? = Value::String(text.to_string());

            applied.insert((edit.file.clone(), path.to_string()), text.to_string());
        }

        for (file, doc) in documents.values() {
            workspace::write_json(file, doc)?;
        }

        let zip_filename = status
            .zip_filename
            .clone()
            .unwrap_or_else(|| bundle_name("translated", None));
        let translated_dir = self.workspace.translated_dir(job_id)?;
        let job_dir = self.workspace.job_dir(job_id)?;
        workspace::zip_directory(&translated_dir, &job_dir.join(&zip_filename))?;

        for entry in status.logs.iter_mut().filter(|e| e.kind.is_editable()) {
            let Some(path) = entry.path.clone() else {
                continue;
            };
            if let Some(text) = applied.get(&(entry.file.clone(), path)) {
                entry.translated = Some(text.clone());
            }
        }
        status.zip_filename = Some(zip_filename);
        self.store.put(job_id, status);

        info!(
            "Job {}: applied {} edit(s) across {} file(s)",
            job_id,
            applied.len(),
            documents.len()
        );

        Ok(EditOutcome {
            applied: applied.len(),
            files: documents.len(),
            download_url: job::download_url(job_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_name() {
        assert_eq!(bundle_name("en", Some("MyGame.zip")), "en_MyGame.zip");
        assert_eq!(bundle_name("fr", Some("Actors.json")), "fr_Actors.zip");
        assert_eq!(bundle_name("en", None), "en_project.zip");
        assert_eq!(bundle_name("en", Some("../../evil name.zip")), "en_evil_name.zip");
    }
}
