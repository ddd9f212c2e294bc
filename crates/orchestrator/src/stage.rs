//! Stage model for the run pipeline.
//!
//! Every stage declares a [`FailurePolicy`]. The pipeline driver turns the
//! raw collaborator result into an explicit [`StageOutcome`] through
//! [`StageOutcome::settle`], so degradation is decided in one place instead
//! of being threaded through error handling at every call site.

use reel_core::RunConfig;
use serde::Serialize;

use crate::error::{OrchestratorError, Result};
use crate::services::ServiceResult;

/// The nine pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Script,
    Scenes,
    Metadata,
    Voice,
    Visuals,
    Assembly,
    Subtitles,
    Thumbnail,
    Publish,
}

impl StageKind {
    pub const ALL: [StageKind; 9] = [
        Self::Script,
        Self::Scenes,
        Self::Metadata,
        Self::Voice,
        Self::Visuals,
        Self::Assembly,
        Self::Subtitles,
        Self::Thumbnail,
        Self::Publish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Scenes => "scenes",
            Self::Metadata => "metadata",
            Self::Voice => "voice",
            Self::Visuals => "visuals",
            Self::Assembly => "assembly",
            Self::Subtitles => "subtitles",
            Self::Thumbnail => "thumbnail",
            Self::Publish => "publish",
        }
    }

    /// 1-based position in the pipeline.
    pub fn number(&self) -> usize {
        Self::ALL
            .iter()
            .position(|stage| stage == self)
            .map(|idx| idx + 1)
            .unwrap_or(0)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Script => "Generating script",
            Self::Scenes => "Splitting script into visual scenes",
            Self::Metadata => "Generating metadata",
            Self::Voice => "Generating voiceover",
            Self::Visuals => "Fetching visuals",
            Self::Assembly => "Assembling video",
            Self::Subtitles => "Generating subtitles",
            Self::Thumbnail => "Creating thumbnail",
            Self::Publish => "Publishing video",
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        match self {
            Self::Script | Self::Metadata | Self::Voice | Self::Visuals | Self::Assembly => {
                FailurePolicy::Fatal
            }
            Self::Scenes | Self::Subtitles | Self::Thumbnail | Self::Publish => {
                FailurePolicy::Degrade
            }
        }
    }

    /// Why the stage does not run for `config`, or `None` when it does.
    pub fn skip_reason(&self, config: &RunConfig) -> Option<&'static str> {
        match self {
            Self::Thumbnail if !config.wants_thumbnail() => Some("portrait format has no thumbnail"),
            Self::Publish if !config.publish() => Some("publishing not requested"),
            _ => None,
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failure aborts the run.
    Fatal,
    /// Failure is recorded and the run continues with a reduced artifact.
    Degrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Degraded,
    Skipped,
}

/// Non-fatal result of running one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Completed(T),
    Degraded(String),
    Skipped(String),
}

impl<T> StageOutcome<T> {
    /// Applies `stage`'s failure policy to a collaborator result.
    pub fn settle(stage: StageKind, result: ServiceResult<T>) -> Result<Self> {
        match result {
            Ok(value) => Ok(Self::Completed(value)),
            Err(err) => match stage.policy() {
                FailurePolicy::Fatal => Err(OrchestratorError::fatal(stage, err.to_string())),
                FailurePolicy::Degrade => Ok(Self::Degraded(err.to_string())),
            },
        }
    }

    pub fn status(&self) -> StageStatus {
        match self {
            Self::Completed(_) => StageStatus::Completed,
            Self::Degraded(_) => StageStatus::Degraded,
            Self::Skipped(_) => StageStatus::Skipped,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Degraded(reason) | Self::Skipped(reason) => Some(reason),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}
