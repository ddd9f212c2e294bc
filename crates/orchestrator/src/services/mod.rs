//! Collaborator interfaces the pipeline depends on.
//!
//! Each trait is a thin seam over one external generation service. The
//! pipeline only sees these traits; concrete adapters live in the
//! `providers` crate and test fakes implement them in memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reel_core::{VideoFormat, VideoMetadata, Visibility};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} is not configured: {reason}")]
    NotConfigured {
        service: &'static str,
        reason: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("{service} API error ({status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{program} failed: {message}")]
    Command { program: String, message: String },

    #[error("No results for {0}")]
    NoResults(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Expected output missing: {0}")]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn not_configured(service: &'static str, reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            service,
            reason: reason.into(),
        }
    }

    pub fn http(err: impl std::fmt::Display) -> Self {
        Self::Http(err.to_string())
    }

    pub fn command(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            message: message.into(),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Timed caption file produced by transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub path: PathBuf,
}

impl CaptionTrack {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Everything the publish collaborator needs for one upload.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub video: &'a Path,
    pub metadata: &'a VideoMetadata,
    pub thumbnail: Option<&'a Path>,
    pub visibility: Visibility,
    pub is_short: bool,
}

#[async_trait]
pub trait ScriptService: Send + Sync {
    async fn generate_script(&self, topic: &str, format: VideoFormat) -> ServiceResult<String>;

    /// Returns the raw, untrusted scene payload. Parsing happens in
    /// [`crate::parsing::parse_scenes`].
    async fn extract_scenes(&self, script: &str, format: VideoFormat) -> ServiceResult<String>;

    /// Returns the raw metadata payload, parsed by
    /// [`crate::parsing::parse_metadata`].
    async fn generate_metadata(&self, topic: &str, script: &str) -> ServiceResult<String>;
}

#[async_trait]
pub trait VoiceService: Send + Sync {
    async fn synthesize(&self, text: &str, output: &Path) -> ServiceResult<()>;
}

#[async_trait]
pub trait VisualService: Send + Sync {
    /// Downloads at most one image matching `query` into `output`.
    /// `Ok(None)` means the search had no results.
    async fn fetch_image(
        &self,
        query: &str,
        format: VideoFormat,
        output: &Path,
    ) -> ServiceResult<Option<PathBuf>>;
}

#[async_trait]
pub trait AssemblyService: Send + Sync {
    async fn assemble(
        &self,
        images: &[PathBuf],
        audio: &Path,
        format: VideoFormat,
        output: &Path,
    ) -> ServiceResult<()>;
}

#[async_trait]
pub trait SubtitleService: Send + Sync {
    async fn transcribe(&self, audio: &Path, output_dir: &Path) -> ServiceResult<CaptionTrack>;

    async fn burn(&self, video: &Path, captions: &CaptionTrack, output: &Path)
        -> ServiceResult<()>;
}

#[async_trait]
pub trait ThumbnailService: Send + Sync {
    async fn render(&self, title: &str, image: &Path, output: &Path) -> ServiceResult<()>;
}

#[async_trait]
pub trait PublishService: Send + Sync {
    /// Uploads the video and returns the hosting platform's video id.
    async fn publish(&self, request: &PublishRequest<'_>) -> ServiceResult<String>;
}

/// The full set of collaborators for one pipeline.
#[derive(Clone)]
pub struct Services {
    pub script: Arc<dyn ScriptService>,
    pub voice: Arc<dyn VoiceService>,
    pub visuals: Arc<dyn VisualService>,
    pub assembly: Arc<dyn AssemblyService>,
    pub subtitles: Arc<dyn SubtitleService>,
    pub thumbnail: Arc<dyn ThumbnailService>,
    pub publish: Arc<dyn PublishService>,
}
