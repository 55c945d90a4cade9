//! Adapter interfaces for external tools.
//!
//! The core never talks to Twitch or encodes video itself. It goes through
//! three capabilities, each backed in production by a command-line tool:
//!
//! | Capability | Tool |
//! |------------|------|
//! | [`TranscriptFetcher`] | TwitchDownloaderCLI |
//! | [`MediaFetcher`] | yt-dlp |
//! | [`Transcoder`] | ffmpeg |

pub mod ffmpeg;
pub mod twitch;
pub mod ytdlp;

use std::path::Path;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::{ClipWindow, Transcript};
use crate::error::ToolError;

pub use ffmpeg::Ffmpeg;
pub use twitch::TwitchDownloaderCli;
pub use ytdlp::YtDlp;

/// A recorded video, identified by its URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VodSource {
    pub url: String,
}

impl VodSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().to_string(),
        }
    }

    /// Video id: the last non-empty path segment of the URL
    pub fn video_id(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').find(|s| !s.is_empty()).unwrap_or_default()
    }
}

/// Downloads the chat transcript for part of a recording
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_transcript(
        &self,
        source: &VodSource,
        range: ClipWindow,
    ) -> Result<Transcript, ToolError>;
}

/// Downloads the media for one time range into `dest`
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(
        &self,
        source: &VodSource,
        window: ClipWindow,
        dest: &Path,
    ) -> Result<(), ToolError>;
}

/// Re-encodes a downloaded segment into a finished clip
#[async_trait]
pub trait Transcoder: Send + Sync {
    fn name(&self) -> &str;

    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Run a tool to completion and fail on a non-zero exit.
///
/// The child is killed if the returned future is dropped, so callers can
/// bound it with a timeout or cancellation.
pub(crate) async fn run_tool(tool: &str, command: &mut Command) -> Result<Output, ToolError> {
    debug!(tool, ?command, "Running external tool");

    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ToolError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::Exit {
            tool: tool.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: last_lines(stderr.trim(), 5),
        });
    }

    Ok(output)
}

/// Last `n` lines of tool output
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
