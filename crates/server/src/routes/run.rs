use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use orchestrator::RunReport;
use reel_core::RunRequest;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct RunResponse {
    #[schema(example = "success")]
    pub status: String,
    pub message: String,
    pub report: RunReport,
}

/// Runs the whole pipeline and answers when it is done.
///
/// The body is a run request object, or a single-element array holding one.
#[utoipa::path(
    post,
    path = "/run",
    request_body = RunRequest,
    responses(
        (status = 200, description = "Video created", body = RunResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 429, description = "Another run is in progress", body = ErrorResponse),
        (status = 500, description = "Run failed", body = ErrorResponse)
    ),
    tag = "runs"
)]
pub async fn run_video(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RunResponse>, AppError> {
    let Json(body) = body?;
    let request = RunRequest::from_json(body)?;
    info!("Run requested over HTTP");

    let report = state.dispatcher.dispatch_request(request).await?;
    Ok(Json(RunResponse {
        status: "success".to_string(),
        message: report.summary(),
        report,
    }))
}
