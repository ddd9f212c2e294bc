//! Admission of runs through the run gate.

use std::sync::Arc;

use reel_core::{RunConfig, RunRequest};
use tracing::{info, warn};

use crate::error::{OrchestratorError, Result};
use crate::pipeline::RunPipeline;
use crate::report::RunReport;
use crate::resources::RunGate;

/// Entry point shared by the CLI and the HTTP server.
///
/// Validation happens before the gate is touched, so a bad request never
/// blocks a valid one and never creates a workspace.
#[derive(Clone)]
pub struct RunDispatcher {
    gate: RunGate,
    pipeline: Arc<RunPipeline>,
}

impl RunDispatcher {
    pub fn new(pipeline: RunPipeline) -> Self {
        Self::with_gate(Arc::new(pipeline), RunGate::new())
    }

    pub fn with_gate(pipeline: Arc<RunPipeline>, gate: RunGate) -> Self {
        Self { gate, pipeline }
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_held()
    }

    pub async fn dispatch_request(&self, request: RunRequest) -> Result<RunReport> {
        let config = request.into_config()?;
        self.dispatch(config).await
    }

    /// Starts a run unless one is already in flight.
    ///
    /// The run executes on its own task and holds the permit until it
    /// finishes, so dropping the returned future (a disconnected HTTP
    /// client) does not cut the run short or leave its workspace behind.
    pub async fn dispatch(&self, config: RunConfig) -> Result<RunReport> {
        let Some(permit) = self.gate.try_acquire() else {
            warn!(topic = %config.topic(), "Run rejected: pipeline busy");
            return Err(OrchestratorError::Busy);
        };

        info!(topic = %config.topic(), "Run admitted");
        let pipeline = Arc::clone(&self.pipeline);
        let handle = tokio::spawn(async move {
            let _permit = permit;
            pipeline.run(&config).await
        });

        handle
            .await
            .map_err(|e| OrchestratorError::Aborted(e.to_string()))?
    }
}
