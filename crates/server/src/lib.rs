//! HTTP trigger surface for video runs.
//!
//! `POST /run` blocks until the run finishes and answers with the run
//! report, or with `busy` when another run holds the gate.

pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reel Studio API",
        version = "0.1.0",
        description = "Trigger end-to-end video generation runs"
    ),
    paths(routes::health_check, routes::run_video),
    components(schemas(
        routes::HealthResponse,
        routes::RunResponse,
        error::ErrorResponse,
        reel_core::RunRequest,
        reel_core::VideoFormat,
        orchestrator::RunReport,
        orchestrator::StageRecord,
        orchestrator::StageKind,
        orchestrator::StageStatus,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "runs", description = "Video generation runs")
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route("/run", post(routes::run_video))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
