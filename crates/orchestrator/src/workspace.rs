//! Per-run workspace directories.
//!
//! Each run owns one directory tree under the workspace base, named after its
//! [`RunId`]. Nothing outside that tree is written during the run except the
//! output directory, and only from [`RunWorkspaceManager::finalize`] and
//! [`RunWorkspaceManager::preserve`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Failed to create workspace {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact not found: {0}")]
    ArtifactMissing(PathBuf),

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove workspace {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid run id: {0}")]
    InvalidRunId(String),
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Identifier of one run. Also the name of its workspace directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Timestamp-derived id with a process-wide sequence suffix, so two runs
    /// created within the same millisecond still get distinct ids.
    pub fn generate() -> Self {
        let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        Self(format!("run_{stamp}_{seq}"))
    }

    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw))
        } else {
            Err(WorkspaceError::InvalidRunId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub workspace_base: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            workspace_base: PathBuf::from(".reel-studio/runs"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl WorkspaceConfig {
    pub fn new(workspace_base: impl Into<PathBuf>) -> Self {
        Self {
            workspace_base: workspace_base.into(),
            ..Default::default()
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

/// Directory layout of one open run.
///
/// The tree is removed when the context is dropped without going through
/// [`RunWorkspaceManager::teardown`] or [`RunWorkspaceManager::retain`],
/// which covers a stage panicking mid-run.
#[derive(Debug)]
pub struct RunContext {
    run_id: RunId,
    root: PathBuf,
    script_dir: PathBuf,
    audio_dir: PathBuf,
    images_dir: PathBuf,
    video_dir: PathBuf,
    armed: bool,
}

impl RunContext {
    fn new(run_id: RunId, root: PathBuf) -> Self {
        Self {
            script_dir: root.join("script"),
            audio_dir: root.join("audio"),
            images_dir: root.join("images"),
            video_dir: root.join("video"),
            run_id,
            root,
            armed: true,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn script_dir(&self) -> &Path {
        &self.script_dir
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }

    pub fn script_path(&self) -> PathBuf {
        self.script_dir.join("script.txt")
    }

    pub fn audio_path(&self) -> PathBuf {
        self.audio_dir.join("voice.mp3")
    }

    pub fn image_path(&self, index: usize) -> PathBuf {
        self.images_dir.join(format!("img{index}.jpg"))
    }

    pub fn silent_video_path(&self) -> PathBuf {
        self.video_dir.join("final.mp4")
    }

    pub fn subtitled_video_path(&self) -> PathBuf {
        self.video_dir.join("final_subtitled.mp4")
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        self.video_dir.join("thumbnail.jpg")
    }

    fn subdirs(&self) -> [&Path; 4] {
        [
            &self.script_dir,
            &self.audio_dir,
            &self.images_dir,
            &self.video_dir,
        ]
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if std::thread::panicking() {
            warn!(run_id = %self.run_id, "Removing workspace {:?} after panic", self.root);
        } else {
            debug!(run_id = %self.run_id, "Removing abandoned workspace {:?}", self.root);
        }
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                run_id = %self.run_id,
                "Failed to remove workspace {:?}: {}", self.root, e
            ),
        }
    }
}

pub struct RunWorkspaceManager {
    config: WorkspaceConfig,
}

impl RunWorkspaceManager {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self { config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Creates the workspace tree for `run_id`. Fails when the root already
    /// exists; run ids are never reused.
    pub async fn open(&self, run_id: RunId) -> Result<RunContext> {
        tokio::fs::create_dir_all(&self.config.workspace_base)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: self.config.workspace_base.clone(),
                source,
            })?;

        let root = self.config.workspace_base.join(run_id.as_str());
        match tokio::fs::create_dir(&root).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(WorkspaceError::AlreadyExists(root));
            }
            Err(source) => return Err(WorkspaceError::Create { path: root, source }),
        }

        let context = RunContext::new(run_id, root);
        for dir in context.subdirs() {
            if let Err(source) = tokio::fs::create_dir(dir).await {
                // Dropping the context removes the partial tree.
                warn!("Failed to create {:?}: {}, cleaning up workspace", dir, source);
                return Err(WorkspaceError::Create {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        }

        info!(run_id = %context.run_id, "Workspace created at {:?}", context.root);
        Ok(context)
    }

    /// Copies the final artifact into the output directory as
    /// `<run_id>-<file name>` and returns the copied path.
    pub async fn finalize(&self, context: &RunContext, artifact: &Path) -> Result<PathBuf> {
        if !tokio::fs::try_exists(artifact).await.unwrap_or(false) {
            return Err(WorkspaceError::ArtifactMissing(artifact.to_path_buf()));
        }

        let destination = self.output_path(context, artifact)?;
        self.copy_out(artifact, &destination).await?;

        info!(run_id = %context.run_id, "Final artifact saved to {:?}", destination);
        Ok(destination)
    }

    /// Copies a secondary file (the thumbnail) next to the final artifact.
    /// Unlike [`Self::finalize`], callers treat failure as a warning.
    pub async fn preserve(&self, context: &RunContext, path: &Path) -> Result<PathBuf> {
        let destination = self.output_path(context, path)?;
        self.copy_out(path, &destination).await?;
        debug!(run_id = %context.run_id, "Preserved {:?}", destination);
        Ok(destination)
    }

    /// Removes the whole workspace tree. Consumes the context: nothing may
    /// write into the workspace afterwards.
    pub async fn teardown(&self, mut context: RunContext) -> Result<()> {
        context.armed = false;
        match tokio::fs::remove_dir_all(&context.root).await {
            Ok(()) => {
                debug!(run_id = %context.run_id, "Workspace removed");
                Ok(())
            }
            Err(source) => {
                warn!(
                    run_id = %context.run_id,
                    "Failed to remove workspace {:?}: {}", context.root, source
                );
                Err(WorkspaceError::Remove {
                    path: context.root.clone(),
                    source,
                })
            }
        }
    }

    /// Leaves the workspace on disk for inspection and returns its root.
    pub fn retain(&self, mut context: RunContext) -> PathBuf {
        context.armed = false;
        warn!(run_id = %context.run_id, "Keeping workspace at {:?}", context.root);
        context.root.clone()
    }

    fn output_path(&self, context: &RunContext, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| WorkspaceError::ArtifactMissing(source.to_path_buf()))?;
        Ok(self
            .config
            .output_dir
            .join(format!("{}-{}", context.run_id, file_name)))
    }

    async fn copy_out(&self, from: &Path, to: &Path) -> Result<()> {
        let copy_err = |source| WorkspaceError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        };
        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(copy_err)?;
        tokio::fs::copy(from, to).await.map_err(copy_err)?;
        Ok(())
    }
}
