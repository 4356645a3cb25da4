//! API Error Handling
//!
//! Every failure is rendered as `{"error": message}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::pipeline::{EditError, StartError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<EditError> for ApiError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::NotReady | EditError::Path { .. } => ApiError::BadRequest(err.to_string()),
            EditError::Other(e) => e.into(),
        }
    }
}

impl From<StartError> for ApiError {
    fn from(err: StartError) -> Self {
        match err {
            StartError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StartError::AlreadyStarted { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobState;
    use crate::path::PathError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ApiError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("busy".into()), StatusCode::CONFLICT),
            (ApiError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_edit_errors_map_to_client_errors() {
        assert!(matches!(ApiError::from(EditError::NotReady), ApiError::BadRequest(_)));

        let err = EditError::Path {
            file: "Map001.json".into(),
            source: PathError::Empty,
        };
        match ApiError::from(err) {
            ApiError::BadRequest(msg) => assert!(msg.contains("Map001.json")),
            other => panic!("unexpected {:?}", other),
        }

        let err = EditError::Other(anyhow::anyhow!("disk full"));
        assert!(matches!(ApiError::from(err), ApiError::Internal(_)));
    }

    #[test]
    fn test_start_errors_map_to_not_found_and_conflict() {
        let job_id = "6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b".to_string();
        assert!(matches!(
            ApiError::from(StartError::NotFound(job_id.clone())),
            ApiError::NotFound(_)
        ));

        let err = StartError::AlreadyStarted {
            job_id,
            state: JobState::Completed,
        };
        match ApiError::from(err) {
            ApiError::Conflict(msg) => assert!(msg.contains("already completed"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
    }
}
