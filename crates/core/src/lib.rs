//! Domain types shared by the run orchestrator, the HTTP server and the CLI.

pub mod domain;
pub mod error;

pub use domain::{RunConfig, RunRequest, VideoFormat, VideoMetadata, Visibility};
pub use error::{CoreError, Result};
