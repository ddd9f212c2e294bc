//! The stage pipeline.
//!
//! [`RunPipeline::run`] brackets one run with its workspace: open before the
//! first stage, finalize on success, tear down on every exit path. Stage
//! failures go through [`StageOutcome::settle`] so each stage's policy is
//! applied at a single boundary.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use reel_core::{RunConfig, VideoFormat, VideoMetadata};
use tracing::{error, info, info_span, warn, Instrument};

use crate::error::{OrchestratorError, Result};
use crate::parsing::{parse_metadata, parse_scenes, shorten_query};
use crate::report::{RunReport, StageRecord};
use crate::services::{PublishRequest, ServiceError, ServiceResult, Services};
use crate::stage::{StageKind, StageOutcome};
use crate::workspace::{RunContext, RunId, RunWorkspaceManager};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on parsed scene descriptions.
    pub max_scenes: usize,
    /// Words kept from a scene description for the retry search.
    pub shortened_query_words: usize,
    /// Generic search used when neither scenes nor topic yield an image.
    pub fallback_query: String,
    pub keep_failed_workspaces: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_scenes: 6,
            shortened_query_words: 3,
            fallback_query: "nature landscape".to_string(),
            keep_failed_workspaces: false,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_scenes(mut self, max: usize) -> Self {
        self.max_scenes = max;
        self
    }

    pub fn with_shortened_query_words(mut self, words: usize) -> Self {
        self.shortened_query_words = words.max(1);
        self
    }

    pub fn with_fallback_query(mut self, query: impl Into<String>) -> Self {
        self.fallback_query = query.into();
        self
    }

    pub fn with_keep_failed_workspaces(mut self, keep: bool) -> Self {
        self.keep_failed_workspaces = keep;
        self
    }
}

/// Values produced by the stages, in the order they are produced.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub script: String,
    pub scenes: Vec<String>,
    pub metadata: VideoMetadata,
    pub voice_track: PathBuf,
    pub images: Vec<PathBuf>,
    pub silent_video: PathBuf,
    /// Absent when the subtitle stage degraded.
    pub subtitled_video: Option<PathBuf>,
    /// Absent for portrait runs or when rendering failed.
    pub thumbnail: Option<PathBuf>,
    pub video_id: Option<String>,
}

impl StageResult {
    /// The file that survives the run: the subtitled video when present,
    /// otherwise the silent one.
    pub fn final_artifact(&self) -> &Path {
        self.subtitled_video
            .as_deref()
            .unwrap_or(self.silent_video.as_path())
    }
}

/// Per-run stage bookkeeping.
#[derive(Default)]
struct StageLog {
    records: Vec<StageRecord>,
}

impl StageLog {
    async fn attempt<T, F>(&mut self, stage: StageKind, work: F) -> Result<StageOutcome<T>>
    where
        F: Future<Output = ServiceResult<T>>,
    {
        let span = info_span!("stage", name = %stage);
        span.in_scope(|| {
            info!(
                "[{}/{}] {}",
                stage.number(),
                StageKind::ALL.len(),
                stage.description()
            )
        });

        let started = Instant::now();
        let result = work.instrument(span.clone()).await;
        let elapsed = started.elapsed();

        let outcome = StageOutcome::settle(stage, result);
        let _entered = span.enter();
        match &outcome {
            Ok(StageOutcome::Degraded(reason)) => {
                warn!(stage = %stage, "Stage degraded, continuing: {}", reason)
            }
            Ok(_) => info!(stage = %stage, elapsed_ms = elapsed.as_millis() as u64, "Stage completed"),
            Err(e) => error!(stage = %stage, "Stage failed: {}", e),
        }
        if let Ok(outcome) = &outcome {
            self.record(stage, outcome, elapsed);
        }
        outcome
    }

    /// Runs a load-bearing stage and unwraps its value.
    async fn require<T, F>(&mut self, stage: StageKind, work: F) -> Result<T>
    where
        F: Future<Output = ServiceResult<T>>,
    {
        match self.attempt(stage, work).await? {
            StageOutcome::Completed(value) => Ok(value),
            other => Err(OrchestratorError::fatal(
                stage,
                other.reason().unwrap_or("stage did not complete").to_string(),
            )),
        }
    }

    fn skip<T>(&mut self, stage: StageKind, reason: &str) -> StageOutcome<T> {
        info!(stage = %stage, "Skipping stage: {}", reason);
        let outcome = StageOutcome::Skipped(reason.to_string());
        self.record(stage, &outcome, Duration::ZERO);
        outcome
    }

    fn record<T>(&mut self, stage: StageKind, outcome: &StageOutcome<T>, elapsed: Duration) {
        self.records.push(StageRecord::new(
            stage,
            outcome.status(),
            outcome.reason(),
            elapsed,
        ));
    }
}

pub struct RunPipeline {
    services: Services,
    workspaces: RunWorkspaceManager,
    config: PipelineConfig,
}

impl RunPipeline {
    pub fn new(services: Services, workspaces: RunWorkspaceManager, config: PipelineConfig) -> Self {
        Self {
            services,
            workspaces,
            config,
        }
    }

    pub async fn run(&self, config: &RunConfig) -> Result<RunReport> {
        self.run_with_id(RunId::generate(), config).await
    }

    pub async fn run_with_id(&self, run_id: RunId, config: &RunConfig) -> Result<RunReport> {
        let span = info_span!("run", run_id = %run_id, topic = %config.topic());
        self.execute(run_id, config).instrument(span).await
    }

    async fn execute(&self, run_id: RunId, config: &RunConfig) -> Result<RunReport> {
        let started = Instant::now();
        info!(
            format = %config.format(),
            publish = config.publish(),
            "Starting run"
        );

        let context = self.workspaces.open(run_id).await?;
        let run_id = context.run_id().to_string();
        let mut log = StageLog::default();
        let mut warnings = Vec::new();

        let outcome = match self.run_stages(&context, config, &mut log).await {
            Ok(result) => self
                .reconcile(&context, &result, &mut warnings)
                .await
                .map(|(artifact, thumbnail)| (result, artifact, thumbnail)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((result, final_artifact, thumbnail)) => {
                // Teardown failure never fails a finalized run.
                if let Err(e) = self.workspaces.teardown(context).await {
                    warnings.push(format!("Workspace not removed: {e}"));
                }

                let report = RunReport {
                    run_id,
                    topic: config.topic().to_string(),
                    format: config.format(),
                    title: result.metadata.title.clone(),
                    subtitled: result.subtitled_video.is_some(),
                    final_artifact,
                    thumbnail,
                    video_id: result.video_id,
                    stages: log.records,
                    warnings,
                    duration_ms: started.elapsed().as_millis() as u64,
                };
                info!("{}", report.summary());
                Ok(report)
            }
            Err(e) => {
                if self.config.keep_failed_workspaces {
                    self.workspaces.retain(context);
                } else {
                    let _ = self.workspaces.teardown(context).await;
                }
                error!("Run failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        ctx: &RunContext,
        config: &RunConfig,
        log: &mut StageLog,
    ) -> Result<StageResult> {
        let services = &self.services;
        let topic = config.topic();
        let format = config.format();

        let script = log
            .require(StageKind::Script, async {
                let script = services.script.generate_script(topic, format).await?;
                let script = script.trim().to_string();
                if script.is_empty() {
                    return Err(ServiceError::InvalidResponse("empty script".into()));
                }
                tokio::fs::write(ctx.script_path(), &script).await?;
                Ok(script)
            })
            .await?;

        let scenes = log
            .attempt(StageKind::Scenes, async {
                let raw = services.script.extract_scenes(&script, format).await?;
                Ok(parse_scenes(&raw, self.config.max_scenes))
            })
            .await?
            .into_value()
            .unwrap_or_default();

        let metadata = log
            .require(StageKind::Metadata, async {
                let raw = services.script.generate_metadata(topic, &script).await?;
                Ok(parse_metadata(&raw, topic))
            })
            .await?;

        let voice_track = log
            .require(StageKind::Voice, async {
                let output = ctx.audio_path();
                services.voice.synthesize(&script, &output).await?;
                ensure_exists(output).await
            })
            .await?;

        let images = log
            .require(StageKind::Visuals, self.acquire_visuals(ctx, topic, format, &scenes))
            .await?;

        let silent_video = log
            .require(StageKind::Assembly, async {
                let output = ctx.silent_video_path();
                services
                    .assembly
                    .assemble(&images, &voice_track, format, &output)
                    .await?;
                ensure_exists(output).await
            })
            .await?;

        let subtitled_video = log
            .attempt(StageKind::Subtitles, async {
                let captions = services
                    .subtitles
                    .transcribe(&voice_track, ctx.audio_dir())
                    .await?;
                let output = ctx.subtitled_video_path();
                services
                    .subtitles
                    .burn(&silent_video, &captions, &output)
                    .await?;
                ensure_exists(output).await
            })
            .await?
            .into_value();

        let thumbnail = match StageKind::Thumbnail.skip_reason(config) {
            Some(reason) => log.skip(StageKind::Thumbnail, reason).into_value(),
            None => log
                .attempt(StageKind::Thumbnail, async {
                    let image = images
                        .first()
                        .ok_or_else(|| ServiceError::NoResults("thumbnail image".into()))?;
                    let output = ctx.thumbnail_path();
                    services
                        .thumbnail
                        .render(&metadata.title, image, &output)
                        .await?;
                    ensure_exists(output).await
                })
                .await?
                .into_value(),
        };

        let mut result = StageResult {
            script,
            scenes,
            metadata,
            voice_track,
            images,
            silent_video,
            subtitled_video,
            thumbnail,
            video_id: None,
        };

        let video_id = match StageKind::Publish.skip_reason(config) {
            Some(reason) => log.skip(StageKind::Publish, reason).into_value(),
            None => {
                let request = PublishRequest {
                    video: result.final_artifact(),
                    metadata: &result.metadata,
                    thumbnail: result.thumbnail.as_deref(),
                    visibility: config.visibility(),
                    is_short: config.is_short(),
                };
                log.attempt(StageKind::Publish, services.publish.publish(&request))
                    .await?
                    .into_value()
            }
        };
        result.video_id = video_id;

        Ok(result)
    }

    /// One image per scene, retrying each miss once with a shortened query.
    /// Without scenes a single topic search is made. When nothing was found
    /// either way, the generic fallback query gets one last search.
    async fn acquire_visuals(
        &self,
        ctx: &RunContext,
        topic: &str,
        format: VideoFormat,
        scenes: &[String],
    ) -> ServiceResult<Vec<PathBuf>> {
        let mut images = Vec::new();

        if scenes.is_empty() {
            info!("No scenes, searching by topic");
            if let Some(path) = self.search(topic, format, &ctx.image_path(0)).await {
                images.push(path);
            }
        }

        for scene in scenes {
            let output = ctx.image_path(images.len());
            if let Some(path) = self.search(scene, format, &output).await {
                images.push(path);
                continue;
            }

            let short = shorten_query(scene, self.config.shortened_query_words);
            if !short.is_empty() && short != scene.trim() {
                if let Some(path) = self.search(&short, format, &output).await {
                    images.push(path);
                    continue;
                }
            }
            warn!(scene = %scene, "No image for scene, dropping it");
        }

        if images.is_empty() {
            warn!(query = %self.config.fallback_query, "No images found, trying fallback query");
            if let Some(path) = self
                .search(&self.config.fallback_query, format, &ctx.image_path(0))
                .await
            {
                images.push(path);
            }
        }

        if images.is_empty() {
            return Err(ServiceError::NoResults(format!(
                "topic '{}' or fallback query '{}'",
                topic, self.config.fallback_query
            )));
        }

        info!(count = images.len(), "Acquired images");
        Ok(images)
    }

    /// A failed search counts as a miss.
    async fn search(&self, query: &str, format: VideoFormat, output: &Path) -> Option<PathBuf> {
        match self.services.visuals.fetch_image(query, format, output).await {
            Ok(found) => found,
            Err(e) => {
                warn!(query = %query, "Image search failed: {}", e);
                None
            }
        }
    }

    /// Copies the final artifact out and preserves the thumbnail next to it.
    async fn reconcile(
        &self,
        ctx: &RunContext,
        result: &StageResult,
        warnings: &mut Vec<String>,
    ) -> Result<(PathBuf, Option<PathBuf>)> {
        let artifact = self
            .workspaces
            .finalize(ctx, result.final_artifact())
            .await?;

        let thumbnail = match &result.thumbnail {
            Some(path) => match self.workspaces.preserve(ctx, path).await {
                Ok(kept) => Some(kept),
                Err(e) => {
                    warn!("Failed to preserve thumbnail: {}", e);
                    warnings.push(format!("Thumbnail not preserved: {e}"));
                    None
                }
            },
            None => None,
        };

        Ok((artifact, thumbnail))
    }
}

async fn ensure_exists(path: PathBuf) -> ServiceResult<PathBuf> {
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        Ok(path)
    } else {
        Err(ServiceError::MissingOutput(path))
    }
}
