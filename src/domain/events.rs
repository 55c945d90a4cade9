//! Project lifecycle events.
//!
//! Every state change of a clipping project is recorded as an immutable
//! event in an append-only log; the project's current state is derived by
//! replaying them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clip::ClipWindow;

/// A single event in a project's log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// The project this event belongs to
    pub project_id: Uuid,

    /// Type of event
    pub event_type: EventType,

    /// Human-readable summary
    pub summary: String,

    /// Clip this event concerns (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipRef>,

    /// Time taken in milliseconds (for completed work)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Error message if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Identifies one clip of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRef {
    pub index: usize,
    pub window: ClipWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Event {
    /// Create a new event with the current timestamp
    pub fn new(project_id: Uuid, event_type: EventType, summary: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            project_id,
            event_type,
            summary: summary.into(),
            clip: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn with_clip(mut self, index: usize, window: ClipWindow, path: Option<PathBuf>) -> Self {
        self.clip = Some(ClipRef {
            index,
            window,
            path,
        });
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Types of events in a project's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Project created, nothing started yet
    ProjectQueued,

    /// Transcript download and analysis started
    ProjectProcessing,

    /// One clip was produced
    ClipCompleted,

    /// One clip failed
    ClipFailed,

    /// A window was skipped before submission
    ClipSkipped,

    /// All clip jobs finished (some may have failed)
    ProjectCompleted,

    /// The request was aborted before clipping
    ProjectFailed,
}
