//! hypeclip - Find hype moments in stream chat and clip them
//!
//! Turns a recorded stream's chat transcript into short video clips of the
//! moments where chat activity spiked.
//!
//! # Architecture
//!
//! - Chat offsets are bucketed into a per-second rate series
//! - Spikes are local maxima of the series' first difference
//! - Spikes become padded windows, merged when close together
//! - Windows are clipped concurrently by external tools, one failure
//!   never failing the batch
//!
//! # Modules
//!
//! - `analysis`: Rate series, spike detection, window synthesis
//! - `adapters`: External tools (TwitchDownloaderCLI, yt-dlp, ffmpeg)
//! - `core`: Clip pipeline, progress, project log, orchestration
//! - `domain`: Data structures (ChatEvent, ClipWindow, ClipJob, Event)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Clip the first two hours of a VOD
//! hypeclip clip https://www.twitch.tv/videos/123456789 --end 2:00:00
//!
//! # Inspect a downloaded transcript offline
//! hypeclip analyze chat.json
//!
//! # Check project status
//! hypeclip status <project-id>
//! ```

pub mod adapters;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use analysis::{analyze, Analysis, DetectionMode, DetectionParams, RateSeries, WindowParams};
pub use core::{BatchReport, ClipPipeline, ClipRequest, Clipper, ProgressSink, StatusBoard};
pub use domain::{ChatEvent, ClipJob, ClipWindow, JobState, Spike, Transcript};
pub use error::{AnalysisError, JobError, ToolError};
