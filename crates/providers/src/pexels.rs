//! Stock image search through the Pexels API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use orchestrator::{ServiceError, ServiceResult, VisualService};
use reel_core::VideoFormat;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::{PexelsConfig, PEXELS_API_KEY_ENV};

const SERVICE: &str = "pexels";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSource,
}

#[derive(Debug, Deserialize)]
struct PhotoSource {
    large: String,
}

pub struct PexelsVisualService {
    client: Client,
    config: PexelsConfig,
}

impl PexelsVisualService {
    pub fn new(config: PexelsConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ServiceError::http)?;
        Ok(Self { client, config })
    }

    async fn search(&self, api_key: &str, query: &str, format: VideoFormat) -> ServiceResult<Option<String>> {
        let response = self
            .client
            .get(format!("{}/v1/search", self.config.base_url.trim_end_matches('/')))
            .header("Authorization", api_key)
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("orientation", format.as_str()),
            ])
            .send()
            .await
            .map_err(ServiceError::http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Pexels search: {e}")))?;

        Ok(body.photos.into_iter().next().map(|photo| photo.src.large))
    }

    async fn download(&self, url: &str, output: &Path) -> ServiceResult<()> {
        let response = self.client.get(url).send().await.map_err(ServiceError::http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message: format!("image download failed: {url}"),
            });
        }

        let bytes = response.bytes().await.map_err(ServiceError::http)?;
        tokio::fs::write(output, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl VisualService for PexelsVisualService {
    async fn fetch_image(
        &self,
        query: &str,
        format: VideoFormat,
        output: &Path,
    ) -> ServiceResult<Option<PathBuf>> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ServiceError::not_configured(SERVICE, format!("{PEXELS_API_KEY_ENV} is not set"))
        })?;

        let Some(url) = self.search(api_key, query, format).await? else {
            debug!(query = %query, "No Pexels result");
            return Ok(None);
        };

        self.download(&url, output).await?;
        debug!(query = %query, "Saved {:?}", output);
        Ok(Some(output.to_path_buf()))
    }
}
