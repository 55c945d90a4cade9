//! Domain types for hypeclip.
//!
//! This module contains the core data structures:
//! - Chat: transcript events
//! - Clip: spikes and clip windows
//! - Job: clip job lifecycle
//! - Events / Project: project log records and replayed state

pub mod chat;
pub mod clip;
pub mod events;
pub mod job;
pub mod project;
pub mod timecode;

// Re-export commonly used types
pub use chat::{ChatEvent, Transcript, MAX_OFFSET_SECONDS};
pub use clip::{ClipWindow, Spike};
pub use events::{ClipRef, Event, EventType};
pub use job::{ClipJob, JobState, TransitionError};
pub use project::{FailedClip, ProducedClip, Project, ProjectState};
pub use timecode::{format_timecode, parse_timecode, TimecodeError};
