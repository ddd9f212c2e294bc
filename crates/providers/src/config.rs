//! Adapter settings.
//!
//! Everything here is plain data loaded from the `[providers]` table of the
//! config file. Secrets are never read from the file; they are picked up
//! from the environment by [`ProvidersConfig::with_env_secrets`].

use serde::{Deserialize, Serialize};

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const PEXELS_API_KEY_ENV: &str = "PEXELS_API_KEY";
pub const YOUTUBE_ACCESS_TOKEN_ENV: &str = "YOUTUBE_ACCESS_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
    pub voice: VoiceConfig,
    pub pexels: PexelsConfig,
    pub media: MediaConfig,
    pub whisper: WhisperConfig,
    pub youtube: YouTubeConfig,
}

impl ProvidersConfig {
    /// Fills API keys and tokens from their environment variables.
    pub fn with_env_secrets(mut self) -> Self {
        self.gemini.api_key = env_secret(GEMINI_API_KEY_ENV);
        self.pexels.api_key = env_secret(PEXELS_API_KEY_ENV);
        self.youtube.access_token = env_secret(YOUTUBE_ACCESS_TOKEN_ENV);
        self
    }
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Number of scenes requested from the model. Set from `[pipeline]`.
    #[serde(skip)]
    pub scene_count: usize,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 60,
            scene_count: 6,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub program: String,
    pub voice: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            program: "edge-tts".to_string(),
            voice: "en-IN-NeerjaNeural".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PexelsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.pexels.com".to_string(),
            timeout_secs: 30,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub fps: u32,
    /// Font file for thumbnail titles. ffmpeg's default font when unset.
    pub font_file: Option<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            fps: 24,
            font_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    pub program: String,
    pub model: String,
    pub language: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            program: "whisper".to_string(),
            model: "tiny".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    pub base_url: String,
    /// "22" is People & Blogs.
    pub category_id: String,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com".to_string(),
            category_id: "22".to_string(),
            timeout_secs: 600,
            access_token: None,
        }
    }
}
