//! Clip normalization via ffmpeg.
//!
//! Every clip is re-encoded with the same fixed settings so that it plays
//! progressively in a browser: H.264 video, AAC audio, `moov` atom first.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, instrument};

use super::{run_tool, Transcoder};
use crate::domain::format_timecode;
use crate::error::ToolError;

const TOOL: &str = "ffmpeg";

/// Encoding settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FfmpegSettings {
    /// x264 preset (default: ultrafast)
    #[serde(default = "default_preset")]
    pub preset: String,

    /// AAC bitrate (default: 128k)
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_preset() -> String {
    "ultrafast".to_string()
}
fn default_audio_bitrate() -> String {
    "128k".to_string()
}

impl Default for FfmpegSettings {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

/// Transcoder backed by the ffmpeg CLI
pub struct Ffmpeg {
    binary_path: String,
    settings: FfmpegSettings,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new(FfmpegSettings::default())
    }
}

impl Ffmpeg {
    pub fn new(settings: FfmpegSettings) -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            settings,
        }
    }

    pub fn with_binary_path(mut self, binary_path: impl Into<String>) -> Self {
        self.binary_path = binary_path.into();
        self
    }

    fn normalize_command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-ss", "00:00:00"])
            .args(["-movflags", "faststart"])
            .args(["-preset", &self.settings.preset])
            .args(["-c:v", "libx264"])
            .args(["-c:a", "aac"])
            .args(["-b:a", &self.settings.audio_bitrate])
            .arg(output);
        command
    }

    fn cut_command(&self, input: &Path, start: u64, end: u64, output: &Path) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-y")
            .args(["-ss", &format_timecode(start)])
            .args(["-to", &format_timecode(end)])
            .arg("-i")
            .arg(input)
            .args(["-c", "copy"])
            .arg(output);
        command
    }

    /// Crop an existing clip to `[start, end]` (seconds into the clip).
    ///
    /// The cut is a stream copy into a temporary file next to `output`,
    /// followed by the standard normalization. The temporary file is removed
    /// whether or not normalization succeeds.
    #[instrument(skip(self))]
    pub async fn trim(
        &self,
        input: &Path,
        start: u64,
        end: u64,
        output: &Path,
    ) -> Result<(), ToolError> {
        if end <= start {
            return Err(ToolError::output(
                TOOL,
                format!("empty trim range {}-{}", start, end),
            ));
        }

        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let temp = tempfile::Builder::new()
            .prefix("trim_")
            .suffix(".mp4")
            .tempfile_in(dir)
            .map_err(|e| ToolError::output(TOOL, format!("cannot create temp file: {}", e)))?
            .into_temp_path();

        run_tool(TOOL, &mut self.cut_command(input, start, end, &temp)).await?;
        self.transcode(&temp, output).await
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    fn name(&self) -> &str {
        TOOL
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        run_tool(TOOL, &mut self.normalize_command(input, output)).await?;
        info!(output = %output.display(), "Clip normalized");
        Ok(())
    }
}
