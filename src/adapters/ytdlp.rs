//! Media segment download via yt-dlp.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, instrument};

use super::{run_tool, MediaFetcher, VodSource};
use crate::domain::{format_timecode, ClipWindow};
use crate::error::ToolError;

const TOOL: &str = "yt-dlp";

/// Download settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtDlpSettings {
    /// Format selector (default: 1080p60 video + best audio, falling back to best)
    #[serde(default = "default_format")]
    pub format: String,

    /// Parallel fragment downloads per clip (default: 5)
    #[serde(default = "default_concurrent_fragments")]
    pub concurrent_fragments: u32,

    /// Retries per failed fragment (default: 1)
    #[serde(default = "default_fragment_retries")]
    pub fragment_retries: u32,
}

fn default_format() -> String {
    "bestvideo[height=1080][fps=60]+bestaudio/best".to_string()
}
fn default_concurrent_fragments() -> u32 {
    5
}
fn default_fragment_retries() -> u32 {
    1
}

impl Default for YtDlpSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            concurrent_fragments: default_concurrent_fragments(),
            fragment_retries: default_fragment_retries(),
        }
    }
}

/// Media fetcher backed by `yt-dlp --download-sections`
pub struct YtDlp {
    binary_path: String,
    settings: YtDlpSettings,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(YtDlpSettings::default())
    }
}

impl YtDlp {
    pub fn new(settings: YtDlpSettings) -> Self {
        Self {
            binary_path: "yt-dlp".to_string(),
            settings,
        }
    }

    pub fn with_binary_path(mut self, binary_path: impl Into<String>) -> Self {
        self.binary_path = binary_path.into();
        self
    }

    fn command(&self, source: &VodSource, window: ClipWindow, dest: &Path) -> Command {
        let section = format!(
            "*{}-{}",
            format_timecode(window.start),
            format_timecode(window.end)
        );

        let mut command = Command::new(&self.binary_path);
        command
            .arg(&source.url)
            .args(["-f", &self.settings.format])
            .args(["--download-sections", &section])
            .args([
                "--concurrent-fragments",
                &self.settings.concurrent_fragments.to_string(),
            ])
            .args([
                "--fragment-retries",
                &self.settings.fragment_retries.to_string(),
            ])
            .arg("--no-cache-dir")
            .arg("--force-overwrites")
            .arg("-o")
            .arg(dest);
        command
    }
}

#[async_trait]
impl MediaFetcher for YtDlp {
    fn name(&self) -> &str {
        TOOL
    }

    #[instrument(skip(self, source), fields(start = window.start, end = window.end))]
    async fn fetch(
        &self,
        source: &VodSource,
        window: ClipWindow,
        dest: &Path,
    ) -> Result<(), ToolError> {
        run_tool(TOOL, &mut self.command(source, window, dest)).await?;

        if !dest.exists() {
            return Err(ToolError::output(
                TOOL,
                format!("no file written to {}", dest.display()),
            ));
        }

        info!(dest = %dest.display(), "Segment downloaded");
        Ok(())
    }
}
