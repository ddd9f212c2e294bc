pub mod dispatch;
pub mod error;
pub mod parsing;
pub mod pipeline;
pub mod report;
pub mod resources;
pub mod services;
pub mod stage;
pub mod workspace;

pub use dispatch::RunDispatcher;
pub use error::{OrchestratorError, Result};
pub use pipeline::{PipelineConfig, RunPipeline, StageResult};
pub use report::{RunReport, StageRecord};
pub use resources::{RunGate, RunPermit};
pub use services::{
    AssemblyService, CaptionTrack, PublishRequest, PublishService, ScriptService, ServiceError,
    ServiceResult, Services, SubtitleService, ThumbnailService, VisualService, VoiceService,
};
pub use stage::{FailurePolicy, StageKind, StageOutcome, StageStatus};
pub use workspace::{RunContext, RunId, RunWorkspaceManager, WorkspaceConfig, WorkspaceError};
