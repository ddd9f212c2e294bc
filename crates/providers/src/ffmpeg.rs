//! Video assembly, subtitle burning and thumbnails with ffmpeg.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use orchestrator::{AssemblyService, ServiceError, ServiceResult, ThumbnailService};
use reel_core::VideoFormat;
use tracing::{debug, info};

use crate::command::run_command;
use crate::config::MediaConfig;

pub const THUMBNAIL_SIZE: (u32, u32) = (1280, 720);
const THUMBNAIL_CHARS_PER_LINE: usize = 25;
const THUMBNAIL_FONT_SIZE: u32 = 72;
const THUMBNAIL_LINE_SPACING: u32 = 15;
const THUMBNAIL_SHADOW_PX: u32 = 3;
/// 140/255 black overlay behind the title.
const THUMBNAIL_OVERLAY: &str = "black@0.55";
const SUBTITLE_STYLE: &str =
    "FontSize=24,PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,Outline=2";

#[derive(Clone)]
pub struct FfmpegMedia {
    config: MediaConfig,
}

impl FfmpegMedia {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Audio length in seconds, via ffprobe.
    pub async fn audio_duration(&self, audio: &Path) -> ServiceResult<f64> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            audio.into(),
        ];
        let stdout = run_command(&self.config.ffprobe, args).await?;
        parse_duration(&stdout)
    }

    /// Burns `srt` into `video` with the fixed caption style; audio is copied.
    pub async fn burn_subtitles(&self, video: &Path, srt: &Path, output: &Path) -> ServiceResult<()> {
        let filter = format!(
            "subtitles='{}':force_style='{}'",
            escape_filter_path(srt),
            SUBTITLE_STYLE
        );
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            video.into(),
            "-vf".into(),
            filter.into(),
            "-c:a".into(),
            "copy".into(),
            output.into(),
        ];
        run_command(&self.config.ffmpeg, args).await?;
        ensure_output(output).await
    }
}

#[async_trait]
impl AssemblyService for FfmpegMedia {
    async fn assemble(
        &self,
        images: &[PathBuf],
        audio: &Path,
        format: VideoFormat,
        output: &Path,
    ) -> ServiceResult<()> {
        if images.is_empty() {
            return Err(ServiceError::NoResults("images to assemble".into()));
        }

        let duration = self.audio_duration(audio).await?;
        let per_image = duration / images.len() as f64;
        info!(
            "Audio {:.1}s, {} images x {:.2}s each",
            duration,
            images.len(),
            per_image
        );

        let mut absolute = Vec::with_capacity(images.len());
        for image in images {
            absolute.push(tokio::fs::canonicalize(image).await?);
        }
        let list_path = output.with_extension("concat.txt");
        tokio::fs::write(&list_path, concat_list(&absolute, per_image)).await?;

        let (width, height) = format.dimensions();
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.into(),
            "-i".into(),
            audio.into(),
            "-vf".into(),
            format!("{},format=yuv420p", cover_filter(width, height)).into(),
            "-r".into(),
            self.config.fps.to_string().into(),
            "-c:v".into(),
            "libx264".into(),
            "-c:a".into(),
            "aac".into(),
            "-shortest".into(),
            output.into(),
        ];
        run_command(&self.config.ffmpeg, args).await?;
        ensure_output(output).await
    }
}

#[async_trait]
impl ThumbnailService for FfmpegMedia {
    async fn render(&self, title: &str, image: &Path, output: &Path) -> ServiceResult<()> {
        let lines = wrap_title(title, THUMBNAIL_CHARS_PER_LINE);
        let text_file = output.with_extension("txt");
        tokio::fs::write(&text_file, lines.join("\n")).await?;

        let (width, height) = THUMBNAIL_SIZE;
        let filter = format!(
            "{},drawbox=x=0:y=0:w=iw:h=ih:color={}:t=fill,{}",
            cover_filter(width, height),
            THUMBNAIL_OVERLAY,
            drawtext_filter(&text_file, self.config.font_file.as_deref())
        );
        debug!("Thumbnail filter: {}", filter);

        let args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            image.into(),
            "-vf".into(),
            filter.into(),
            "-frames:v".into(),
            "1".into(),
            "-q:v".into(),
            "2".into(),
            output.into(),
        ];
        run_command(&self.config.ffmpeg, args).await?;
        ensure_output(output).await
    }
}

async fn ensure_output(output: &Path) -> ServiceResult<()> {
    if tokio::fs::try_exists(output).await.unwrap_or(false) {
        Ok(())
    } else {
        Err(ServiceError::MissingOutput(output.to_path_buf()))
    }
}

fn parse_duration(stdout: &str) -> ServiceResult<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ServiceError::InvalidResponse(format!("ffprobe duration: {:?}", stdout.trim())))
}

/// Scale to cover the frame, then center-crop to it.
fn cover_filter(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=increase,crop={width}:{height},setsar=1"
    )
}

/// Input for ffmpeg's concat demuxer. The last image is listed twice so its
/// duration is honoured.
fn concat_list(images: &[PathBuf], seconds_each: f64) -> String {
    let mut list = String::new();
    for image in images {
        list.push_str(&format!(
            "file '{}'\nduration {:.3}\n",
            quote_concat_path(image),
            seconds_each
        ));
    }
    if let Some(last) = images.last() {
        list.push_str(&format!("file '{}'\n", quote_concat_path(last)));
    }
    list
}

fn quote_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Escapes a path for use inside a quoted filtergraph argument.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', r"\:")
        .replace('\'', r"\'")
}

fn drawtext_filter(text_file: &Path, font_file: Option<&str>) -> String {
    let mut filter = format!(
        "drawtext=textfile='{}':fontsize={}:fontcolor=white:line_spacing={}:\
         shadowcolor=black:shadowx={shadow}:shadowy={shadow}:\
         x=(w-text_w)/2:y=(h-text_h)/2",
        escape_filter_path(text_file),
        THUMBNAIL_FONT_SIZE,
        THUMBNAIL_LINE_SPACING,
        shadow = THUMBNAIL_SHADOW_PX,
    );
    if let Some(font) = font_file {
        filter.push_str(&format!(":fontfile='{}'", escape_filter_path(Path::new(font))));
    }
    filter
}

/// Upper-cases the title and greedily wraps it at `max_chars` per line.
/// A single word longer than the limit gets a line of its own.
pub fn wrap_title(title: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in title.to_uppercase().split_whitespace() {
        let candidate_len = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if candidate_len <= max_chars || current.is_empty() {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
