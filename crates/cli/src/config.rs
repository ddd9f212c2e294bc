//! `reel-studio.toml` loading.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use orchestrator::{PipelineConfig, WorkspaceConfig};
use providers::ProvidersConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "reel-studio.toml";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub paths: PathsConfig,
    pub server: ServerConfig,
    pub pipeline: PipelineSettings,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Parent of the per-run workspaces.
    pub workspace_root: PathBuf,
    /// Where finished videos land.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let workspace = WorkspaceConfig::default();
        Self {
            workspace_root: workspace.workspace_base,
            output_dir: workspace.output_dir,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub scene_count: usize,
    pub shortened_query_words: usize,
    pub fallback_query: String,
    pub keep_failed_workspaces: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            scene_count: pipeline.max_scenes,
            shortened_query_words: pipeline.shortened_query_words,
            fallback_query: pipeline.fallback_query,
            keep_failed_workspaces: pipeline.keep_failed_workspaces,
        }
    }
}

impl StudioConfig {
    /// Reads `explicit` if given, otherwise `reel-studio.toml` in the working
    /// directory when it exists. Returns the file that was read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) if !path.exists() => bail!("Config file not found: {}", path.display()),
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if !default.exists() {
                    return Ok((Self::default(), None));
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok((config, Some(path)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.pipeline.scene_count == 0 {
            bail!("pipeline.scene_count must be at least 1");
        }
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn workspace_config(&self) -> WorkspaceConfig {
        WorkspaceConfig::new(&self.paths.workspace_root).with_output_dir(&self.paths.output_dir)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_max_scenes(self.pipeline.scene_count)
            .with_shortened_query_words(self.pipeline.shortened_query_words)
            .with_fallback_query(self.pipeline.fallback_query.clone())
            .with_keep_failed_workspaces(self.pipeline.keep_failed_workspaces)
    }

    /// Adapter settings with secrets filled in from the environment.
    pub fn providers_config(&self) -> ProvidersConfig {
        let mut providers = self.providers.clone().with_env_secrets();
        providers.gemini.scene_count = self.pipeline.scene_count;
        providers
    }
}
