use reel_core::CoreError;
use thiserror::Error;

use crate::stage::StageKind;
use crate::workspace::WorkspaceError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Trigger input rejected before any stage ran.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// A load-bearing stage failed and the run was aborted.
    #[error("Stage {stage} failed: {reason}")]
    FatalStage { stage: StageKind, reason: String },

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// The run gate is held by another run. The request never started.
    #[error("Pipeline already running")]
    Busy,

    /// The run task ended without producing a result (panic).
    #[error("Run aborted: {0}")]
    Aborted(String),
}

impl OrchestratorError {
    /// Create a fatal stage error.
    pub fn fatal(stage: StageKind, reason: impl Into<String>) -> Self {
        Self::FatalStage {
            stage,
            reason: reason.into(),
        }
    }

    /// The stage that aborted the run, if this is a stage failure.
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            Self::FatalStage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
