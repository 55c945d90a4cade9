//! Values passed between detection and clipping.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::timecode::format_timecode;

/// A candidate hype instant and the derivative height at that second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spike {
    pub second: u64,
    pub height: i64,
}

impl Spike {
    pub fn new(second: u64, height: i64) -> Self {
        Self { second, height }
    }
}

/// An inclusive `[start, end]` range of seconds to cut into a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipWindow {
    pub start: u64,
    pub end: u64,
}

impl ClipWindow {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// A window with no positive length cannot be clipped
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    pub fn duration_seconds(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

impl fmt::Display for ClipWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_timecode(self.start),
            format_timecode(self.end)
        )
    }
}
