//! Adapters from the orchestrator's collaborator traits to real services.
//!
//! | stage | adapter |
//! |---|---|
//! | script, scenes, metadata | [`gemini::GeminiScriptService`] |
//! | voice | [`edge_tts::EdgeTtsVoiceService`] |
//! | visuals | [`pexels::PexelsVisualService`] |
//! | assembly, thumbnail | [`ffmpeg::FfmpegMedia`] |
//! | subtitles | [`whisper::WhisperSubtitleService`] |
//! | publish | [`youtube::YouTubePublishService`] |

pub mod command;
pub mod config;
pub mod edge_tts;
pub mod ffmpeg;
pub mod gemini;
pub mod pexels;
pub mod whisper;
pub mod youtube;

use std::sync::Arc;

use orchestrator::{ServiceResult, Services};

pub use config::{
    GeminiConfig, MediaConfig, PexelsConfig, ProvidersConfig, VoiceConfig, WhisperConfig,
    YouTubeConfig,
};

/// Wires every stage to its default adapter.
pub fn build_services(config: &ProvidersConfig) -> ServiceResult<Services> {
    let media = ffmpeg::FfmpegMedia::new(config.media.clone());
    let gemini = gemini::GeminiClient::new(config.gemini.clone())?;

    Ok(Services {
        script: Arc::new(gemini::GeminiScriptService::new(gemini)),
        voice: Arc::new(edge_tts::EdgeTtsVoiceService::new(config.voice.clone())),
        visuals: Arc::new(pexels::PexelsVisualService::new(config.pexels.clone())?),
        assembly: Arc::new(media.clone()),
        subtitles: Arc::new(whisper::WhisperSubtitleService::new(
            config.whisper.clone(),
            media.clone(),
        )),
        thumbnail: Arc::new(media),
        publish: Arc::new(youtube::YouTubePublishService::new(config.youtube.clone())?),
    })
}

/// External programs the adapters shell out to.
pub fn required_programs(config: &ProvidersConfig) -> Vec<&str> {
    vec![
        config.voice.program.as_str(),
        config.media.ffmpeg.as_str(),
        config.media.ffprobe.as_str(),
        config.whisper.program.as_str(),
    ]
}
