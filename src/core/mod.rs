//! Core clipping machinery.
//!
//! This module contains:
//! - Pipeline: bounded-concurrency acquire/transcode jobs
//! - Progress: last-write-wins status reporting
//! - ProjectLog: append-only project events
//! - Clipper: request orchestration

pub mod clipper;
pub mod pipeline;
pub mod progress;
pub mod project_log;

// Re-export commonly used types
pub use clipper::{ClipReport, ClipRequest, Clipper, ClipperSettings};
pub use pipeline::{
    output_path, temp_path, BatchReport, ClipFailure, ClipOutput, ClipPipeline,
    PipelineSettings, SkippedWindow,
};
pub use progress::{ProgressSink, StatusBoard};
pub use project_log::ProjectLog;
