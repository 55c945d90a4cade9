//! Project state and reconstruction from events.
//!
//! A Project is one clipping request for one VOD.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clip::ClipWindow;
use super::events::{Event, EventType};

/// A clipping project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,

    /// Source VOD URL
    pub vod_url: String,

    /// Current state
    pub state: ProjectState,

    pub created_at: DateTime<Utc>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Produced clips, ordered by clip index
    pub clips: Vec<ProducedClip>,

    /// Clips that failed, with reasons
    pub failures: Vec<FailedClip>,

    /// Windows skipped before submission
    pub skipped: Vec<ClipWindow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedClip {
    pub index: usize,
    pub window: ClipWindow,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedClip {
    pub index: usize,
    pub window: ClipWindow,
    pub error: String,
}

impl Project {
    pub fn new(id: Uuid, vod_url: String) -> Self {
        Self {
            id,
            vod_url,
            state: ProjectState::Queued,
            created_at: Utc::now(),
            completed_at: None,
            clips: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Reconstruct project state from a sequence of events
    pub fn from_events(events: &[Event]) -> Option<Self> {
        let first = events.first()?;

        let mut project = Self::new(first.project_id, String::new());
        project.created_at = first.timestamp;

        for event in events {
            project.apply_event(event);
        }

        project.clips.sort_by_key(|c| c.index);
        project.failures.sort_by_key(|f| f.index);

        Some(project)
    }

    /// Apply a single event to update project state
    pub fn apply_event(&mut self, event: &Event) {
        match event.event_type {
            EventType::ProjectQueued => {
                self.state = ProjectState::Queued;
                self.created_at = event.timestamp;
                // Queued events carry the VOD URL as their summary
                self.vod_url = event.summary.clone();
            }
            EventType::ProjectProcessing => {
                self.state = ProjectState::Processing;
            }
            EventType::ClipCompleted => {
                if let Some(clip) = &event.clip {
                    if let Some(path) = &clip.path {
                        self.clips.push(ProducedClip {
                            index: clip.index,
                            window: clip.window,
                            path: path.clone(),
                        });
                    }
                }
            }
            EventType::ClipFailed => {
                if let Some(clip) = &event.clip {
                    self.failures.push(FailedClip {
                        index: clip.index,
                        window: clip.window,
                        error: event.error.clone().unwrap_or_default(),
                    });
                }
            }
            EventType::ClipSkipped => {
                if let Some(clip) = &event.clip {
                    self.skipped.push(clip.window);
                }
            }
            EventType::ProjectCompleted => {
                self.state = ProjectState::Completed;
                self.completed_at = Some(event.timestamp);
            }
            EventType::ProjectFailed => {
                self.state = ProjectState::Failed {
                    error: event.error.clone().unwrap_or_default(),
                };
                self.completed_at = Some(event.timestamp);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            ProjectState::Completed | ProjectState::Failed { .. }
        )
    }

    /// Human-readable status line, e.g. "Completed (3 of 4 clips)"
    pub fn status_line(&self) -> String {
        let attempted = self.clips.len() + self.failures.len();
        match &self.state {
            ProjectState::Queued => "In queue".to_string(),
            ProjectState::Processing => "Processing".to_string(),
            ProjectState::Completed => {
                format!("Completed ({} of {} clips)", self.clips.len(), attempted)
            }
            ProjectState::Failed { error } => format!("Failed: {}", error),
        }
    }
}

/// State of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ProjectState {
    Queued,
    Processing,
    Completed,
    Failed { error: String },
}
