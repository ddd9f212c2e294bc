use std::time::Duration;

use async_trait::async_trait;
use orchestrator::{ScriptService, ServiceError, ServiceResult};
use reel_core::VideoFormat;
use reqwest::Client;
use tracing::{debug, error};

use super::prompts::{metadata_prompt, scenes_prompt, script_prompt};
use super::types::{GeminiErrorResponse, GenerateContentRequest, GenerateContentResponse};
use crate::config::{GeminiConfig, GEMINI_API_KEY_ENV};

const SERVICE: &str = "gemini";

/// Client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ServiceError::http)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Sends one prompt and returns the first candidate's text.
    pub async fn generate(&self, prompt: &str) -> ServiceResult<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ServiceError::not_configured(SERVICE, format!("{GEMINI_API_KEY_ENV} is not set"))
        })?;

        debug!(
            "Calling Gemini model {} ({} prompt chars)",
            self.config.model,
            prompt.len()
        );

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.config.base_url.trim_end_matches('/'),
                self.config.model
            ))
            .query(&[("key", api_key)])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(ServiceError::http)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            error!("Gemini API error ({}): {}", status.as_u16(), message);
            return Err(ServiceError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Gemini response: {e}")))?;

        let text = body
            .first_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::InvalidResponse("Gemini returned no text".into()))?;

        Ok(text)
    }
}

/// [`ScriptService`] backed by Gemini.
pub struct GeminiScriptService {
    client: GeminiClient,
}

impl GeminiScriptService {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScriptService for GeminiScriptService {
    async fn generate_script(&self, topic: &str, format: VideoFormat) -> ServiceResult<String> {
        self.client.generate(&script_prompt(topic, format)).await
    }

    async fn extract_scenes(&self, script: &str, _format: VideoFormat) -> ServiceResult<String> {
        let prompt = scenes_prompt(script, self.client.config().scene_count);
        self.client.generate(&prompt).await
    }

    async fn generate_metadata(&self, topic: &str, script: &str) -> ServiceResult<String> {
        self.client.generate(&metadata_prompt(topic, script)).await
    }
}
