//! Job API Handlers
//!
//! Upload, start, poll, download and edit translation jobs.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::job::{JobStatus, LogEntry};
use crate::runner::TranslationRequest;

/// POST /api/upload
/// Store a `.zip` project or single `.json` file under a new job
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::BadRequest("No selected file".to_string()));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let job_id = Uuid::new_v4().to_string();
        tracing::info!("Upload {} ({} bytes) -> job {}", filename, bytes.len(), job_id);

        let workspace = state.pipeline.workspace().clone();
        let (id, name) = (job_id.clone(), filename.clone());
        let job_dir =
            tokio::task::spawn_blocking(move || workspace.save_upload(&id, &name, &bytes)).await??;

        state
            .pipeline
            .store()
            .put(&job_id, JobStatus::uploaded(&filename));

        return Ok(Json(json!({
            "message": "File uploaded successfully",
            "job_id": job_id,
            "file_path": job_dir.display().to_string(),
        })));
    }

    Err(ApiError::BadRequest("No file part".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct TranslateBody {
    pub job_id: Option<String>,
    pub target_language: Option<String>,
    pub source_language: Option<String>,
}

/// POST /api/translate
/// Start an uploaded job in the background and acknowledge immediately.
/// Unknown jobs get a 404, jobs already started or finished a 409.
pub async fn translate(
    State(state): State<AppState>,
    Json(body): Json<TranslateBody>,
) -> ApiResult<impl IntoResponse> {
    let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
    let (Some(job_id), Some(target_language)) = (non_empty(body.job_id), non_empty(body.target_language))
    else {
        return Err(ApiError::BadRequest(
            "Missing job_id or target_language".to_string(),
        ));
    };
    let source_language =
        non_empty(body.source_language).unwrap_or_else(|| state.default_source_language.to_string());

    tracing::info!("Translate request for job {}", job_id);
    state.runner.submit(TranslationRequest {
        job_id,
        target_language,
        source_language,
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "processing", "message": "Translation has started." })),
    ))
}

/// GET /api/status/:job_id
pub async fn status(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<JobStatus> {
    tracing::debug!("Status poll for job {}", job_id);
    Json(state.pipeline.store().get(&job_id))
}

/// GET /api/download/:job_id
/// Serve the finished bundle as an attachment
pub async fn download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let not_ready = || ApiError::NotFound("File not ready or not found.".to_string());

    let status = state.pipeline.store().get(&job_id);
    if !status.is_completed() {
        return Err(not_ready());
    }
    let zip_filename = status.zip_filename.ok_or_else(not_ready)?;
    let job_dir = state
        .pipeline
        .workspace()
        .job_dir(&job_id)
        .map_err(|_| not_ready())?;

    let body = tokio::fs::read(job_dir.join(&zip_filename))
        .await
        .map_err(|_| not_ready())?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", zip_filename),
            ),
        ],
        body,
    ))
}

/// GET /api/translated_data/:job_id
pub async fn translated_data(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let status = state.pipeline.store().get(&job_id);
    if !status.is_completed() {
        return Err(ApiError::BadRequest(
            "Translation not yet completed.".to_string(),
        ));
    }
    Ok(Json(json!({ "logs": status.logs })))
}

#[derive(Debug, Deserialize)]
pub struct EditBody {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// POST /api/edit/:job_id
/// Apply manual corrections and rebuild the bundle
pub async fn edit(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(body): Json<EditBody>,
) -> ApiResult<Json<Value>> {
    if body.logs.is_empty() {
        return Err(ApiError::BadRequest("No edited logs provided.".to_string()));
    }

    let pipeline = Arc::clone(&state.pipeline);
    let outcome =
        tokio::task::spawn_blocking(move || pipeline.apply_edits(&job_id, &body.logs)).await??;

    Ok(Json(json!({
        "message": "Translations updated successfully.",
        "download_url": outcome.download_url,
    })))
}
