use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::{OrchestratorError, StageKind};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug)]
pub enum AppError {
    /// Request body or field rejected before the run started.
    BadRequest {
        message: String,
        field: Option<&'static str>,
    },
    /// Another run holds the gate.
    Busy(String),
    /// The run started and did not produce an artifact.
    RunFailed {
        message: String,
        stage: Option<StageKind>,
    },
}

/// Body of every non-success response from `POST /run`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// `busy` or `error`.
    #[schema(example = "error")]
    pub status: String,
    pub message: String,
    /// Stage that aborted the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageKind>,
    /// Request field that failed validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest { message, field } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    status: "error".to_string(),
                    message,
                    stage: None,
                    field: field.map(str::to_string),
                },
            ),
            AppError::Busy(message) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse {
                    status: "busy".to_string(),
                    message,
                    stage: None,
                    field: None,
                },
            ),
            AppError::RunFailed { message, stage } => {
                tracing::error!(stage = ?stage, "Run failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        status: "error".to_string(),
                        message,
                        stage,
                        field: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Validation(core) => AppError::BadRequest {
                field: Some(core.field()),
                message: core.to_string(),
            },
            OrchestratorError::Busy => AppError::Busy(
                "A video is already being generated. Try again when it finishes.".to_string(),
            ),
            other => AppError::RunFailed {
                stage: other.failed_stage(),
                message: other.to_string(),
            },
        }
    }
}

impl From<reel_core::CoreError> for AppError {
    fn from(err: reel_core::CoreError) -> Self {
        OrchestratorError::Validation(err).into()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
            field: Some("body"),
        }
    }
}
