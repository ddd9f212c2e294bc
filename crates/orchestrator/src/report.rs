use std::path::PathBuf;
use std::time::Duration;

use reel_core::VideoFormat;
use serde::Serialize;

use crate::stage::{StageKind, StageStatus};

/// What happened to one stage during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StageRecord {
    pub stage: StageKind,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub duration_ms: u64,
}

impl StageRecord {
    pub fn new(stage: StageKind, status: StageStatus, note: Option<&str>, elapsed: Duration) -> Self {
        Self {
            stage,
            status,
            note: note.map(str::to_string),
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Summary of a successful run, degraded stages included.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RunReport {
    pub run_id: String,
    pub topic: String,
    pub format: VideoFormat,
    pub title: String,
    /// Copy of the final artifact in the output directory.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub final_artifact: PathBuf,
    pub subtitled: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub thumbnail: Option<PathBuf>,
    pub video_id: Option<String>,
    pub stages: Vec<StageRecord>,
    /// Housekeeping problems after the artifact was saved, such as a
    /// workspace that could not be removed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn degraded(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages
            .iter()
            .filter(|record| record.status == StageStatus::Degraded)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded().next().is_some()
    }

    /// One-line human readable outcome.
    pub fn summary(&self) -> String {
        let mut summary = format!("Video created: {}", self.final_artifact.display());
        if let Some(id) = &self.video_id {
            summary.push_str(&format!(" (published as {id})"));
        }

        let degraded: Vec<_> = self.degraded().map(|r| r.stage.as_str()).collect();
        if !degraded.is_empty() {
            summary.push_str(&format!("; degraded: {}", degraded.join(", ")));
        }
        if !self.warnings.is_empty() {
            summary.push_str(&format!("; {} warning(s)", self.warnings.len()));
        }
        summary
    }
}
