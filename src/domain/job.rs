//! Clip job lifecycle.
//!
//! ```text
//! Pending → Acquiring → Transcoding → Done
//!              │            │
//!              └────────────┴──→ Failed
//! (any non-terminal state) ────→ Cancelled
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::clip::ClipWindow;

/// State of a single clip job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Submitted, waiting for a worker slot
    Pending,

    /// Media segment is being downloaded
    Acquiring,

    /// Downloaded segment is being re-encoded
    Transcoding,

    /// Finished clip written
    Done,

    /// Download or transcode failed
    Failed,

    /// Stopped by a cancellation request
    Cancelled,
}

impl Default for JobState {
    fn default() -> Self {
        Self::Pending
    }
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }

    /// Whether the job is holding a worker slot
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Acquiring | Self::Transcoding)
    }

    fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, Acquiring)
                | (Acquiring, Transcoding)
                | (Transcoding, Done)
                | (Acquiring, Failed)
                | (Transcoding, Failed)
                | (Pending, Cancelled)
                | (Acquiring, Cancelled)
                | (Transcoding, Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job transition for clip {index}: {from:?} → {to:?}")]
pub struct TransitionError {
    pub index: usize,
    pub from: JobState,
    pub to: JobState,
}

/// One window's unit of work
#[derive(Debug, Clone)]
pub struct ClipJob {
    /// Position of the window in the synthesized sequence
    pub index: usize,
    pub window: ClipWindow,
    state: JobState,
}

impl ClipJob {
    pub fn new(index: usize, window: ClipWindow) -> Self {
        Self {
            index,
            window,
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// 1-based number used in file names and progress messages
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn advance(&mut self, next: JobState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                index: self.index,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ClipJob {
        ClipJob::new(2, ClipWindow::new(25, 105))
    }

    #[test]
    fn test_happy_path() {
        let mut job = job();
        assert_eq!(job.state(), JobState::Pending);
        assert_eq!(job.number(), 3);

        job.advance(JobState::Acquiring).unwrap();
        assert!(job.state().is_active());
        job.advance(JobState::Transcoding).unwrap();
        job.advance(JobState::Done).unwrap();
        assert!(job.state().is_terminal());
    }

    #[test]
    fn test_failure_from_either_working_state() {
        let mut acquiring = job();
        acquiring.advance(JobState::Acquiring).unwrap();
        acquiring.advance(JobState::Failed).unwrap();

        let mut transcoding = job();
        transcoding.advance(JobState::Acquiring).unwrap();
        transcoding.advance(JobState::Transcoding).unwrap();
        transcoding.advance(JobState::Failed).unwrap();
        assert_eq!(transcoding.state(), JobState::Failed);
    }

    #[test]
    fn test_rejected_transitions() {
        let mut job = job();
        let err = job.advance(JobState::Failed).unwrap_err();
        assert_eq!(err.from, JobState::Pending);
        assert_eq!(err.to, JobState::Failed);

        assert!(job.advance(JobState::Transcoding).is_err());

        job.advance(JobState::Acquiring).unwrap();
        job.advance(JobState::Failed).unwrap();
        // Terminal states are final; no retries at this layer
        assert!(job.advance(JobState::Acquiring).is_err());
        assert!(job.advance(JobState::Cancelled).is_err());
    }

    #[test]
    fn test_cancel_while_pending() {
        let mut job = job();
        job.advance(JobState::Cancelled).unwrap();
        assert!(job.state().is_terminal());
        assert!(!job.state().is_active());
    }
}
