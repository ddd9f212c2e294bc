use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use orchestrator::{ServiceError, ServiceResult, VoiceService};
use tracing::debug;

use crate::command::run_command;
use crate::config::VoiceConfig;

/// Voiceover through the `edge-tts` command line tool.
pub struct EdgeTtsVoiceService {
    config: VoiceConfig,
}

impl EdgeTtsVoiceService {
    pub fn new(config: VoiceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VoiceService for EdgeTtsVoiceService {
    async fn synthesize(&self, text: &str, output: &Path) -> ServiceResult<()> {
        // Scripts can exceed argv limits, so the text goes through a file.
        let text_file = output.with_extension("txt");
        tokio::fs::write(&text_file, text).await?;

        debug!(voice = %self.config.voice, "Synthesizing {} chars", text.len());
        let args: [&OsStr; 6] = [
            OsStr::new("--voice"),
            OsStr::new(&self.config.voice),
            OsStr::new("--file"),
            text_file.as_os_str(),
            OsStr::new("--write-media"),
            output.as_os_str(),
        ];
        run_command(&self.config.program, args).await?;

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(ServiceError::MissingOutput(output.to_path_buf()));
        }
        Ok(())
    }
}
