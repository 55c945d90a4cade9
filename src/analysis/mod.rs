//! Chat activity analysis.
//!
//! This module contains:
//! - Rate: per-second message counts and their first difference
//! - Peaks: spike detection (global, per segment, hybrid)
//! - Windows: spike → clip window synthesis

pub mod peaks;
pub mod rate;
pub mod windows;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{ChatEvent, ClipWindow, Spike};
use crate::error::AnalysisError;

pub use peaks::{global_spikes, hybrid_spikes, local_maxima, segmented_spikes};
pub use rate::{derivative, RateSeries};
pub use windows::{merge_windows, synthesize, WindowParams};

/// Spike detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Minimum derivative height for a spike (default: 7)
    #[serde(default = "default_min_height")]
    pub min_height: i64,

    /// Spikes kept in global mode (default: 5)
    #[serde(default = "default_global_top")]
    pub global_top: usize,

    /// Segment length in seconds for segmented mode (default: 600)
    #[serde(default = "default_segment_length")]
    pub segment_length: u64,

    /// Spikes kept per segment (default: 2)
    #[serde(default = "default_segment_top")]
    pub segment_top: usize,
}

fn default_min_height() -> i64 {
    7
}
fn default_global_top() -> usize {
    5
}
fn default_segment_length() -> u64 {
    600
} // 10 min
fn default_segment_top() -> usize {
    2
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_height: default_min_height(),
            global_top: default_global_top(),
            segment_length: default_segment_length(),
            segment_top: default_segment_top(),
        }
    }
}

/// Which spikes to collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Strongest spikes over the whole recording
    Global,

    /// Strongest spikes within each segment
    Segmented,

    /// Union of both, one spike per second
    #[default]
    Hybrid,
}

/// Result of analyzing one transcript
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Spikes, strongest first
    pub spikes: Vec<Spike>,

    /// Merged windows, ordered by start
    pub windows: Vec<ClipWindow>,

    /// Number of chat events analyzed
    pub event_count: u64,

    /// Length of the analyzed timeline in seconds
    pub duration_seconds: u64,
}

/// Detect spikes in a rate series
pub fn detect(series: &RateSeries, mode: DetectionMode, params: &DetectionParams) -> Vec<Spike> {
    match mode {
        DetectionMode::Global => global_spikes(series, params),
        DetectionMode::Segmented => peaks::rank(segmented_spikes(series, params)),
        DetectionMode::Hybrid => hybrid_spikes(series, params),
    }
}

/// Full analysis: events → series → spikes → windows
pub fn analyze(
    events: &[ChatEvent],
    mode: DetectionMode,
    detection: &DetectionParams,
    window_params: &WindowParams,
) -> Result<Analysis, AnalysisError> {
    let series = RateSeries::from_events(events)?;
    let spikes = detect(&series, mode, detection);
    debug!(?spikes, "Detected spikes");

    let windows = synthesize(&spikes, window_params);
    info!(
        events = series.total(),
        spikes = spikes.len(),
        windows = windows.len(),
        ?mode,
        "Chat analysis complete"
    );

    Ok(Analysis {
        spikes,
        windows,
        event_count: series.total(),
        duration_seconds: series.len() as u64,
    })
}
