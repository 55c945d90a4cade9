//! Chat transcript download via TwitchDownloaderCLI.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, instrument};

use super::{run_tool, TranscriptFetcher, VodSource};
use crate::domain::{format_timecode, ClipWindow, Transcript};
use crate::error::ToolError;

const TOOL: &str = "TwitchDownloaderCLI";

/// Transcript fetcher that shells out to `TwitchDownloaderCLI chatdownload`
pub struct TwitchDownloaderCli {
    binary_path: String,
}

impl Default for TwitchDownloaderCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TwitchDownloaderCli {
    pub fn new() -> Self {
        Self::with_binary_path("TwitchDownloaderCLI")
    }

    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    fn command(&self, video_id: &str, range: ClipWindow, output: &std::path::Path) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("chatdownload")
            .args(["--id", video_id])
            .arg("-o")
            .arg(output)
            .args(["-b", &format_timecode(range.start)])
            .args(["-e", &format_timecode(range.end)])
            .args(["--collision", "Overwrite"]);
        command
    }
}

#[async_trait]
impl TranscriptFetcher for TwitchDownloaderCli {
    fn name(&self) -> &str {
        TOOL
    }

    #[instrument(skip(self), fields(video_id = source.video_id()))]
    async fn fetch_transcript(
        &self,
        source: &VodSource,
        range: ClipWindow,
    ) -> Result<Transcript, ToolError> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| ToolError::output(TOOL, format!("cannot create temp dir: {}", e)))?;
        let chat_path = temp_dir.path().join("chat.json");

        run_tool(TOOL, &mut self.command(source.video_id(), range, &chat_path)).await?;

        let content = tokio::fs::read_to_string(&chat_path)
            .await
            .map_err(|e| ToolError::output(TOOL, format!("missing chat file: {}", e)))?;

        let transcript =
            Transcript::from_json(&content).map_err(|e| ToolError::output(TOOL, e.to_string()))?;

        info!(messages = transcript.len(), "Chat transcript downloaded");
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_command_arguments() {
        let fetcher = TwitchDownloaderCli::with_binary_path("/opt/tdl");
        let command = fetcher.command("2482589381", ClipWindow::new(5520, 9960), Path::new("chat.json"));
        let std_command = command.as_std();

        assert_eq!(std_command.get_program(), "/opt/tdl");
        let args: Vec<_> = std_command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "chatdownload",
                "--id",
                "2482589381",
                "-o",
                "chat.json",
                "-b",
                "1:32:00",
                "-e",
                "2:46:00",
                "--collision",
                "Overwrite"
            ]
        );
    }

    #[test]
    fn test_name() {
        assert_eq!(TwitchDownloaderCli::new().name(), "TwitchDownloaderCLI");
    }
}
