//! Error types shared across analysis, adapters and the clip pipeline.

use std::time::Duration;

use thiserror::Error;

use crate::domain::TransitionError;

/// Errors that abort an analysis request outright
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("No chat activity to analyze")]
    EmptyInput,

    #[error("Malformed chat transcript: {0}")]
    MalformedTranscript(String),

    #[error("Chat offset {0}s is past the longest supported recording")]
    OffsetOutOfRange(u64),
}

/// Failures from an external tool invocation
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    Exit {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("{tool} produced unusable output: {message}")]
    Output { tool: String, message: String },
}

impl ToolError {
    pub fn output(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Output {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Errors that fail a single clip job without touching the rest of the batch
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Acquisition failed: {0}")]
    Acquisition(#[source] ToolError),

    #[error("Transcode failed: {0}")]
    Transcode(#[source] ToolError),

    #[error("Job timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Temporary file error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Job task aborted: {0}")]
    Aborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::Exit {
            tool: "yt-dlp".to_string(),
            code: 1,
            stderr: "ERROR: Unable to download".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "yt-dlp failed with exit code 1: ERROR: Unable to download"
        );

        let job_err = JobError::Acquisition(err);
        assert!(job_err.to_string().starts_with("Acquisition failed: yt-dlp"));
    }

    #[test]
    fn test_empty_input_display() {
        assert_eq!(
            AnalysisError::EmptyInput.to_string(),
            "No chat activity to analyze"
        );
    }
}
