use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use orchestrator::{
    AssemblyService, CaptionTrack, PipelineConfig, PublishRequest, PublishService,
    RunDispatcher, RunGate, RunPipeline, RunWorkspaceManager, ScriptService, ServiceError,
    ServiceResult, Services, SubtitleService, ThumbnailService, VisualService, VoiceService,
    WorkspaceConfig,
};
use reel_core::VideoFormat;
use serde_json::{json, Value};
use server::{create_router, state::AppState};
use tempfile::TempDir;

struct StubScript {
    fail: bool,
}

#[async_trait]
impl ScriptService for StubScript {
    async fn generate_script(&self, topic: &str, _format: VideoFormat) -> ServiceResult<String> {
        if self.fail {
            return Err(ServiceError::not_configured("gemini", "GEMINI_API_KEY is not set"));
        }
        Ok(format!("A short story about {topic}."))
    }

    async fn extract_scenes(&self, _script: &str, _format: VideoFormat) -> ServiceResult<String> {
        Ok(r#"["mountain at dawn"]"#.to_string())
    }

    async fn generate_metadata(&self, topic: &str, _script: &str) -> ServiceResult<String> {
        Ok(format!("TITLE: {topic} explained\nDESCRIPTION: Short.\nTAGS: {topic}"))
    }
}

struct StubMedia;

#[async_trait]
impl VoiceService for StubMedia {
    async fn synthesize(&self, _text: &str, output: &Path) -> ServiceResult<()> {
        tokio::fs::write(output, b"audio").await?;
        Ok(())
    }
}

#[async_trait]
impl VisualService for StubMedia {
    async fn fetch_image(
        &self,
        _query: &str,
        _format: VideoFormat,
        output: &Path,
    ) -> ServiceResult<Option<PathBuf>> {
        tokio::fs::write(output, b"jpg").await?;
        Ok(Some(output.to_path_buf()))
    }
}

#[async_trait]
impl AssemblyService for StubMedia {
    async fn assemble(
        &self,
        _images: &[PathBuf],
        _audio: &Path,
        _format: VideoFormat,
        output: &Path,
    ) -> ServiceResult<()> {
        tokio::fs::write(output, b"silent").await?;
        Ok(())
    }
}

#[async_trait]
impl SubtitleService for StubMedia {
    async fn transcribe(&self, _audio: &Path, output_dir: &Path) -> ServiceResult<CaptionTrack> {
        let path = output_dir.join("voice.srt");
        tokio::fs::write(&path, "1\n00:00:00,000 --> 00:00:01,000\nhi\n").await?;
        Ok(CaptionTrack::new(path))
    }

    async fn burn(&self, _video: &Path, _captions: &CaptionTrack, output: &Path) -> ServiceResult<()> {
        tokio::fs::write(output, b"subtitled").await?;
        Ok(())
    }
}

#[async_trait]
impl ThumbnailService for StubMedia {
    async fn render(&self, _title: &str, _image: &Path, output: &Path) -> ServiceResult<()> {
        tokio::fs::write(output, b"thumb").await?;
        Ok(())
    }
}

#[async_trait]
impl PublishService for StubMedia {
    async fn publish(&self, _request: &PublishRequest<'_>) -> ServiceResult<String> {
        Ok("yt-1".to_string())
    }
}

struct TestApp {
    server: TestServer,
    tmp: TempDir,
    gate: RunGate,
}

impl TestApp {
    fn workspace_count(&self) -> usize {
        std::fs::read_dir(self.tmp.path().join("runs"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn setup_test_server(fail_script: bool) -> TestApp {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let media = Arc::new(StubMedia);
    let services = Services {
        script: Arc::new(StubScript { fail: fail_script }),
        voice: media.clone(),
        visuals: media.clone(),
        assembly: media.clone(),
        subtitles: media.clone(),
        thumbnail: media.clone(),
        publish: media,
    };
    let workspaces = RunWorkspaceManager::new(
        WorkspaceConfig::new(tmp.path().join("runs")).with_output_dir(tmp.path().join("output")),
    );
    let pipeline = RunPipeline::new(services, workspaces, PipelineConfig::default());

    let gate = RunGate::new();
    let dispatcher = RunDispatcher::with_gate(Arc::new(pipeline), gate.clone());
    let app = create_router(AppState::new(dispatcher));
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp { server, tmp, gate }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = setup_test_server(false);

        let response = app.server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["run_in_progress"], false);
    }

    #[tokio::test]
    async fn test_health_reports_held_gate() {
        let app = setup_test_server(false);
        let _permit = app.gate.try_acquire().unwrap();

        let body: Value = app.server.get("/health").await.json();
        assert_eq!(body["run_in_progress"], true);
    }

    #[tokio::test]
    async fn test_openapi_document_lists_run() {
        let app = setup_test_server(false);

        let response = app.server.get("/api/openapi.json").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["paths"]["/run"]["post"].is_object());
    }
}

mod run {
    use super::*;

    #[tokio::test]
    async fn test_run_returns_report() {
        let app = setup_test_server(false);

        let response = app
            .server
            .post("/run")
            .json(&json!({ "topic": "glaciers", "format": "video" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "success");
        assert!(body["message"].as_str().unwrap().starts_with("Video created"));
        assert_eq!(body["report"]["title"], "glaciers explained");
        assert_eq!(body["report"]["subtitled"], true);

        let artifact = PathBuf::from(body["report"]["final_artifact"].as_str().unwrap());
        assert!(artifact.starts_with(app.tmp.path().join("output")));
        assert_eq!(std::fs::read(artifact).unwrap(), b"subtitled");
        assert_eq!(app.workspace_count(), 0);
    }

    #[tokio::test]
    async fn test_single_element_array_is_accepted() {
        let app = setup_test_server(false);

        let response = app
            .server
            .post("/run")
            .json(&json!([{ "topic": "tides", "format": "short", "upload": "yes", "privacy": "public" }]))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["report"]["format"], "portrait");
        assert_eq!(body["report"]["video_id"], "yt-1");
        assert!(body["report"]["thumbnail"].is_null());
    }

    #[tokio::test]
    async fn test_busy_when_gate_is_held() {
        let app = setup_test_server(false);
        let _permit = app.gate.try_acquire().unwrap();

        let response = app
            .server
            .post("/run")
            .json(&json!({ "topic": "glaciers" }))
            .await;

        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        let body: Value = response.json();
        assert_eq!(body["status"], "busy");
        assert!(body["message"].is_string());
        assert_eq!(app.workspace_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_topic_is_rejected() {
        let app = setup_test_server(false);

        let response = app
            .server
            .post("/run")
            .json(&json!({ "topic": "   " }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["status"], "error");
        assert_eq!(body["field"], "topic");
        assert_eq!(app.workspace_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_array_is_rejected() {
        let app = setup_test_server(false);

        let response = app.server.post("/run").json(&json!([])).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["field"], "body");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = setup_test_server(false);

        let response = app.server.post("/run").text("topic=glaciers").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_invalid_validation_does_not_hold_gate() {
        let app = setup_test_server(false);

        app.server
            .post("/run")
            .json(&json!({ "topic": "glaciers", "format": "square" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        app.server
            .post("/run")
            .json(&json!({ "topic": "glaciers" }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_fatal_stage_names_the_stage() {
        let app = setup_test_server(true);

        let response = app
            .server
            .post("/run")
            .json(&json!({ "topic": "glaciers" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["status"], "error");
        assert_eq!(body["stage"], "script");
        assert!(body["message"].as_str().unwrap().contains("GEMINI_API_KEY"));
        assert_eq!(app.workspace_count(), 0);
        assert!(!app.gate.is_held());
    }
}
