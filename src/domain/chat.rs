//! Chat transcript types.
//!
//! Only the whole-second offset of each message matters to detection; the
//! rest of the downloaded transcript is ignored.

use serde::Deserialize;

use crate::error::AnalysisError;

/// Latest accepted message offset in seconds (7 days)
pub const MAX_OFFSET_SECONDS: u64 = 7 * 24 * 3600;

/// One chat message, reduced to the second it was posted at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatEvent {
    /// Seconds since the start of the recording
    pub offset_seconds: u64,
}

impl ChatEvent {
    pub fn new(offset_seconds: u64) -> Self {
        Self { offset_seconds }
    }
}

/// An ordered chat transcript
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub events: Vec<ChatEvent>,
}

/// Transcript file layout written by TwitchDownloaderCLI
#[derive(Debug, Deserialize)]
struct TranscriptFile {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
struct Comment {
    content_offset_seconds: f64,
}

impl Transcript {
    pub fn new(events: Vec<ChatEvent>) -> Self {
        Self { events }
    }

    /// Parse a downloaded chat JSON document.
    ///
    /// Fractional offsets are truncated to the whole second. Negative,
    /// non-finite and offsets past [`MAX_OFFSET_SECONDS`] are rejected.
    pub fn from_json(content: &str) -> Result<Self, AnalysisError> {
        let file: TranscriptFile = serde_json::from_str(content)
            .map_err(|e| AnalysisError::MalformedTranscript(e.to_string()))?;

        let events = file
            .comments
            .into_iter()
            .map(|c| {
                if !c.content_offset_seconds.is_finite() || c.content_offset_seconds < 0.0 {
                    return Err(AnalysisError::MalformedTranscript(format!(
                        "invalid comment offset: {}",
                        c.content_offset_seconds
                    )));
                }
                let second = c.content_offset_seconds.trunc();
                if second > MAX_OFFSET_SECONDS as f64 {
                    return Err(AnalysisError::MalformedTranscript(format!(
                        "comment offset {} is past {} seconds",
                        c.content_offset_seconds, MAX_OFFSET_SECONDS
                    )));
                }
                Ok(ChatEvent::new(second as u64))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript() {
        let json = r#"{
            "streamer": {"name": "someone"},
            "comments": [
                {"content_offset_seconds": 1.9, "message": {"body": "hi"}},
                {"content_offset_seconds": 2.0},
                {"content_offset_seconds": 0.2}
            ]
        }"#;

        let transcript = Transcript::from_json(json).unwrap();
        let offsets: Vec<u64> = transcript.events.iter().map(|e| e.offset_seconds).collect();
        assert_eq!(offsets, vec![1, 2, 0]);
    }

    #[test]
    fn test_missing_comments_is_empty() {
        let transcript = Transcript::from_json("{}").unwrap();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_rejects_garbage() {
        let result = Transcript::from_json("not json");
        assert!(matches!(result, Err(AnalysisError::MalformedTranscript(_))));

        let result = Transcript::from_json(r#"{"comments":[{"content_offset_seconds": -3.0}]}"#);
        assert!(matches!(result, Err(AnalysisError::MalformedTranscript(_))));
    }

    #[test]
    fn test_rejects_offsets_past_ceiling() {
        for offset in ["1e30", "1e12", "604801.0"] {
            let json = format!(r#"{{"comments":[{{"content_offset_seconds": {}}}]}}"#, offset);
            let result = Transcript::from_json(&json);
            assert!(
                matches!(result, Err(AnalysisError::MalformedTranscript(_))),
                "offset {} was accepted",
                offset
            );
        }

        let json = r#"{"comments":[{"content_offset_seconds": 604800.9}]}"#;
        let transcript = Transcript::from_json(json).unwrap();
        assert_eq!(transcript.events, vec![ChatEvent::new(MAX_OFFSET_SECONDS)]);
    }
}
