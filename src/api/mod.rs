//! API Module
//!
//! HTTP surface of the translator. Each submodule handles one group of
//! endpoints.

pub mod error;
pub mod health;
pub mod job;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::pipeline::Pipeline;
use crate::runner::JobRunner;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub runner: Arc<JobRunner>,
    pub default_source_language: Arc<str>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(runner: Arc<JobRunner>, default_source_language: &str, max_upload_bytes: usize) -> Self {
        Self {
            pipeline: Arc::clone(runner.pipeline()),
            runner,
            default_source_language: Arc::from(default_source_language),
            max_upload_bytes,
        }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/api/upload", post(job::upload))
        .route("/api/translate", post(job::translate))
        .route("/api/status/:job_id", get(job::status))
        .route("/api/download/:job_id", get(job::download))
        .route("/api/translated_data/:job_id", get(job::translated_data))
        .route("/api/edit/:job_id", post(job::edit))
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
