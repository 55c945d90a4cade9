//! Per-second chat message rate.

use crate::domain::{ChatEvent, MAX_OFFSET_SECONDS};
use crate::error::AnalysisError;

/// Dense message counts, one slot per second from 0 to the last active second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSeries {
    counts: Vec<u64>,
}

impl RateSeries {
    /// Bucket events by their whole-second offset.
    ///
    /// Offsets past [`MAX_OFFSET_SECONDS`] are rejected before allocating.
    pub fn from_events(events: &[ChatEvent]) -> Result<Self, AnalysisError> {
        let max_second = events
            .iter()
            .map(|e| e.offset_seconds)
            .max()
            .ok_or(AnalysisError::EmptyInput)?;

        let len = Some(max_second)
            .filter(|&m| m <= MAX_OFFSET_SECONDS)
            .and_then(|m| usize::try_from(m).ok())
            .and_then(|m| m.checked_add(1))
            .ok_or(AnalysisError::OffsetOutOfRange(max_second))?;

        let mut counts = vec![0u64; len];
        for event in events {
            counts[event.offset_seconds as usize] += 1;
        }

        Ok(Self { counts })
    }

    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Last second covered by the series
    pub fn max_second(&self) -> u64 {
        self.counts.len().saturating_sub(1) as u64
    }

    /// Total number of events
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Inclusive sub-range `[start, end]`, clamped to the series
    pub fn slice(&self, start: u64, end: u64) -> &[u64] {
        if self.counts.is_empty() || start > self.max_second() {
            return &[];
        }
        let end = end.min(self.max_second());
        if end < start {
            return &[];
        }
        &self.counts[start as usize..=end as usize]
    }

    pub fn derivative(&self) -> Vec<i64> {
        derivative(&self.counts)
    }
}

/// First difference with an implicit zero before the first element
pub fn derivative(counts: &[u64]) -> Vec<i64> {
    let mut previous = 0i64;
    counts
        .iter()
        .map(|&count| {
            let current = count as i64;
            let diff = current - previous;
            previous = current;
            diff
        })
        .collect()
}
