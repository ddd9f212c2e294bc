//! Publishing through the YouTube Data API v3 resumable upload protocol.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use orchestrator::{PublishRequest, PublishService, ServiceError, ServiceResult};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{YouTubeConfig, YOUTUBE_ACCESS_TOKEN_ENV};

const SERVICE: &str = "youtube";
const MAX_TITLE_CHARS: usize = 100;
const SHORTS_TAG: &str = "#Shorts";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    snippet: Snippet,
    status: Status,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    description: String,
    tags: Vec<String>,
    category_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    privacy_status: String,
    self_declared_made_for_kids: bool,
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

pub struct YouTubePublishService {
    client: Client,
    config: YouTubeConfig,
}

impl YouTubePublishService {
    pub fn new(config: YouTubeConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ServiceError::http)?;
        Ok(Self { client, config })
    }

    fn upload_url(&self, path: &str) -> String {
        format!(
            "{}/upload/youtube/v3/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    fn resource(&self, request: &PublishRequest<'_>) -> VideoResource {
        let metadata = request.metadata;
        VideoResource {
            snippet: Snippet {
                title: metadata.title.chars().take(MAX_TITLE_CHARS).collect(),
                description: description_for(&metadata.description, request.is_short),
                tags: metadata.tags.clone(),
                category_id: self.config.category_id.clone(),
            },
            status: Status {
                privacy_status: request.visibility.as_str().to_string(),
                self_declared_made_for_kids: false,
            },
        }
    }

    async fn start_session(&self, token: &str, resource: &VideoResource, size: usize) -> ServiceResult<String> {
        let response = self
            .client
            .post(self.upload_url("videos"))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", size.to_string())
            .json(resource)
            .send()
            .await
            .map_err(ServiceError::http)?;
        let response = check(response).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::InvalidResponse("upload session has no Location".into()))
    }

    async fn upload(&self, token: &str, session_url: &str, video: Vec<u8>) -> ServiceResult<String> {
        let response = self
            .client
            .put(session_url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "video/mp4")
            .body(video)
            .send()
            .await
            .map_err(ServiceError::http)?;
        let response = check(response).await?;

        let uploaded: UploadedVideo = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("upload response: {e}")))?;
        Ok(uploaded.id)
    }

    async fn set_thumbnail(&self, token: &str, video_id: &str, thumbnail: &Path) -> ServiceResult<()> {
        let image = tokio::fs::read(thumbnail).await?;
        let response = self
            .client
            .post(self.upload_url("thumbnails/set"))
            .query(&[("videoId", video_id)])
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "image/jpeg")
            .body(image)
            .send()
            .await
            .map_err(ServiceError::http)?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl PublishService for YouTubePublishService {
    async fn publish(&self, request: &PublishRequest<'_>) -> ServiceResult<String> {
        let token = self.config.access_token.as_deref().ok_or_else(|| {
            ServiceError::not_configured(SERVICE, format!("{YOUTUBE_ACCESS_TOKEN_ENV} is not set"))
        })?;

        let video = tokio::fs::read(request.video).await?;
        let resource = self.resource(request);
        info!(
            "Uploading '{}' to YouTube ({}, {} bytes)",
            resource.snippet.title,
            resource.status.privacy_status,
            video.len()
        );

        let session_url = self.start_session(token, &resource, video.len()).await?;
        let video_id = self.upload(token, &session_url, video).await?;
        info!("Video uploaded: https://youtube.com/watch?v={}", video_id);

        if let Some(thumbnail) = request.thumbnail {
            match self.set_thumbnail(token, &video_id, thumbnail).await {
                Ok(()) => info!("Thumbnail set"),
                Err(e) => warn!("Thumbnail upload failed: {}", e),
            }
        }

        Ok(video_id)
    }
}

async fn check(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ServiceError::Api {
        service: SERVICE,
        status: status.as_u16(),
        message,
    })
}

/// Shorts are tagged in the description unless the tag is already there.
fn description_for(description: &str, is_short: bool) -> String {
    if !is_short || description.to_lowercase().contains(&SHORTS_TAG.to_lowercase()) {
        return description.to_string();
    }
    if description.trim().is_empty() {
        SHORTS_TAG.to_string()
    } else {
        format!("{}\n\n{}", description.trim_end(), SHORTS_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_for_shorts() {
        assert_eq!(description_for("Quick tip.", true), "Quick tip.\n\n#Shorts");
        assert_eq!(description_for("Tip #shorts", true), "Tip #shorts");
        assert_eq!(description_for("", true), "#Shorts");
        assert_eq!(description_for("Long form.", false), "Long form.");
    }
}
