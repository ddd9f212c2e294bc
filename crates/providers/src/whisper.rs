use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use orchestrator::{CaptionTrack, ServiceError, ServiceResult, SubtitleService};
use tracing::info;

use crate::command::run_command;
use crate::config::WhisperConfig;
use crate::ffmpeg::FfmpegMedia;

/// Transcribes with the local `whisper` CLI and burns captions with ffmpeg.
pub struct WhisperSubtitleService {
    config: WhisperConfig,
    media: FfmpegMedia,
}

impl WhisperSubtitleService {
    pub fn new(config: WhisperConfig, media: FfmpegMedia) -> Self {
        Self { config, media }
    }
}

/// whisper names its output after the input file's stem.
fn srt_path(audio: &Path, output_dir: &Path) -> PathBuf {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "captions".to_string());
    output_dir.join(format!("{stem}.srt"))
}

#[async_trait]
impl SubtitleService for WhisperSubtitleService {
    async fn transcribe(&self, audio: &Path, output_dir: &Path) -> ServiceResult<CaptionTrack> {
        let args: Vec<OsString> = vec![
            audio.into(),
            "--model".into(),
            self.config.model.as_str().into(),
            "--output_format".into(),
            "srt".into(),
            "--output_dir".into(),
            output_dir.into(),
            "--language".into(),
            self.config.language.as_str().into(),
        ];
        run_command(&self.config.program, args).await?;

        let srt = srt_path(audio, output_dir);
        if !tokio::fs::try_exists(&srt).await.unwrap_or(false) {
            return Err(ServiceError::MissingOutput(srt));
        }
        info!("Captions written to {:?}", srt);
        Ok(CaptionTrack::new(srt))
    }

    async fn burn(
        &self,
        video: &Path,
        captions: &CaptionTrack,
        output: &Path,
    ) -> ServiceResult<()> {
        self.media.burn_subtitles(video, &captions.path, output).await
    }
}
