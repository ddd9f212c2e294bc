use std::path::Path;

use orchestrator::{
    PublishRequest, PublishService, ScriptService, ServiceError, VisualService,
};
use providers::gemini::{GeminiClient, GeminiScriptService};
use providers::pexels::PexelsVisualService;
use providers::youtube::YouTubePublishService;
use providers::{GeminiConfig, PexelsConfig, YouTubeConfig};
use reel_core::{VideoFormat, VideoMetadata, Visibility};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ], "role": "model" } }
        ]
    })
}

fn gemini(server: &MockServer, api_key: Option<&str>) -> GeminiScriptService {
    let config = GeminiConfig {
        base_url: server.uri(),
        api_key: api_key.map(str::to_string),
        ..Default::default()
    };
    GeminiScriptService::new(GeminiClient::new(config).unwrap())
}

mod gemini {
    use super::*;

    #[tokio::test]
    async fn test_generate_script_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
                "  Volcanoes are mountains that breathe fire.\n",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let script = gemini(&server, Some("test-key"))
            .generate_script("volcanoes", VideoFormat::Landscape)
            .await
            .unwrap();

        assert_eq!(script, "Volcanoes are mountains that breathe fire.");
    }

    #[tokio::test]
    async fn test_scene_prompt_is_sent_as_single_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(gemini_reply(r#"["lava", "ash"]"#)),
            )
            .mount(&server)
            .await;

        let raw = gemini(&server, Some("k"))
            .extract_scenes("Lava flows. Ash falls.", VideoFormat::Portrait)
            .await
            .unwrap();
        assert_eq!(raw, r#"["lava", "ash"]"#);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("into 6 visual scenes"));
        assert!(text.contains("Lava flows. Ash falls."));
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let err = gemini(&server, Some("k"))
            .generate_metadata("volcanoes", "script")
            .await
            .unwrap_err();

        match err {
            ServiceError::Api {
                service,
                status,
                message,
            } => {
                assert_eq!(service, "gemini");
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = gemini(&server, None)
            .generate_script("volcanoes", VideoFormat::Landscape)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotConfigured { .. }));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_empty_candidates_are_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = gemini(&server, Some("k"))
            .generate_script("volcanoes", VideoFormat::Landscape)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }
}

mod pexels {
    use super::*;

    fn pexels(server: &MockServer) -> PexelsVisualService {
        PexelsVisualService::new(PexelsConfig {
            base_url: server.uri(),
            api_key: Some("pexels-key".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_image_downloads_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header("Authorization", "pexels-key"))
            .and(query_param("query", "lava river"))
            .and(query_param("per_page", "1"))
            .and(query_param("orientation", "portrait"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "photos": [ { "id": 1, "src": { "large": format!("{}/photos/1.jpg", server.uri()) } } ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/photos/1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("img0.jpg");
        let found = pexels(&server)
            .fetch_image("lava river", VideoFormat::Portrait, &output)
            .await
            .unwrap();

        assert_eq!(found.as_deref(), Some(output.as_path()));
        assert_eq!(std::fs::read(&output).unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_no_photos_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "photos": [] })))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("img0.jpg");
        let found = pexels(&server)
            .fetch_image("nothing", VideoFormat::Landscape, &output)
            .await
            .unwrap();

        assert!(found.is_none());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_unauthorized_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let err = pexels(&server)
            .fetch_image("lava", VideoFormat::Landscape, &tmp.path().join("img0.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Api { status: 401, .. }));
    }
}

mod youtube {
    use super::*;

    fn youtube(server: &MockServer) -> YouTubePublishService {
        YouTubePublishService::new(YouTubeConfig {
            base_url: server.uri(),
            access_token: Some("tok".into()),
            ..Default::default()
        })
        .unwrap()
    }

    async fn mount_upload(server: &MockServer, expected_resource: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .and(query_param("uploadType", "resumable"))
            .and(header("Authorization", "Bearer tok"))
            .and(body_partial_json(expected_resource))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/upload/session/abc", server.uri())),
            )
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/session/abc"))
            .and(header("Content-Type", "video/mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "vid123" })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn write(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_short_is_published_with_shorts_tag() {
        let server = MockServer::start().await;
        mount_upload(
            &server,
            json!({
                "snippet": {
                    "title": "Daily Tip",
                    "description": "Save time.\n\n#Shorts",
                    "tags": ["tips"],
                    "categoryId": "22"
                },
                "status": { "privacyStatus": "public", "selfDeclaredMadeForKids": false }
            }),
        )
        .await;

        let tmp = TempDir::new().unwrap();
        let video = write(tmp.path(), "final_subtitled.mp4", b"mp4");
        let metadata = VideoMetadata::new("Daily Tip", "Save time.", vec!["tips".into()]);
        let request = PublishRequest {
            video: &video,
            metadata: &metadata,
            thumbnail: None,
            visibility: Visibility::Public,
            is_short: true,
        };

        let id = youtube(&server).publish(&request).await.unwrap();
        assert_eq!(id, "vid123");
    }

    #[tokio::test]
    async fn test_thumbnail_failure_is_only_logged() {
        let server = MockServer::start().await;
        mount_upload(&server, json!({ "status": { "privacyStatus": "private" } })).await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/thumbnails/set"))
            .and(query_param("videoId", "vid123"))
            .respond_with(ResponseTemplate::new(403).set_body_string("not verified"))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let video = write(tmp.path(), "final.mp4", b"mp4");
        let thumbnail = write(tmp.path(), "thumbnail.jpg", b"jpg");
        let metadata = VideoMetadata::new("Volcanoes", "About volcanoes.", Vec::new());
        let request = PublishRequest {
            video: &video,
            metadata: &metadata,
            thumbnail: Some(&thumbnail),
            visibility: Visibility::Private,
            is_short: false,
        };

        let id = youtube(&server).publish(&request).await.unwrap();
        assert_eq!(id, "vid123");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let service = YouTubePublishService::new(YouTubeConfig::default()).unwrap();
        let tmp = TempDir::new().unwrap();
        let video = write(tmp.path(), "final.mp4", b"mp4");
        let metadata = VideoMetadata::from_topic("volcanoes");
        let request = PublishRequest {
            video: &video,
            metadata: &metadata,
            thumbnail: None,
            visibility: Visibility::Private,
            is_short: false,
        };

        let err = service.publish(&request).await.unwrap_err();
        assert!(err.to_string().contains("YOUTUBE_ACCESS_TOKEN"));
    }
}
