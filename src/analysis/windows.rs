//! Turns ranked spikes into merged clip windows.

use serde::{Deserialize, Serialize};

use crate::domain::{ClipWindow, Spike};

/// Window shaping parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowParams {
    /// Seconds of context on each side of a spike (default: 15)
    #[serde(default = "default_half_width")]
    pub half_width: u64,

    /// Windows whose gap is at most this many seconds are merged (default: 30)
    #[serde(default = "default_merge_margin")]
    pub merge_margin: u64,
}

fn default_half_width() -> u64 {
    15
}
fn default_merge_margin() -> u64 {
    30
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            half_width: default_half_width(),
            merge_margin: default_merge_margin(),
        }
    }
}

/// Build one window per spike and merge neighbours.
///
/// Input order does not matter. Output is sorted by start, and consecutive
/// windows are more than `merge_margin` seconds apart.
pub fn synthesize(spikes: &[Spike], params: &WindowParams) -> Vec<ClipWindow> {
    let raw: Vec<ClipWindow> = spikes
        .iter()
        .map(|s| {
            ClipWindow::new(
                s.second.saturating_sub(params.half_width),
                s.second + params.half_width,
            )
        })
        .collect();

    merge_windows(raw, params.merge_margin)
}

/// Sort windows and sweep-merge any whose start is within `margin` of the
/// current window's end
pub fn merge_windows(mut windows: Vec<ClipWindow>, margin: u64) -> Vec<ClipWindow> {
    windows.sort();

    let mut merged: Vec<ClipWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(current) if window.start <= current.end + margin => {
                current.end = current.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_spike() {
        let windows = synthesize(&[Spike::new(100, 9)], &WindowParams::default());
        assert_eq!(windows, vec![ClipWindow::new(85, 115)]);
    }

    #[test]
    fn test_spike_at_zero_is_clamped() {
        let windows = synthesize(&[Spike::new(0, 9)], &WindowParams::default());
        assert_eq!(windows, vec![ClipWindow::new(0, 15)]);
    }

    #[test]
    fn test_nearby_spikes_merge() {
        let windows = synthesize(
            &[Spike::new(90, 8), Spike::new(40, 20)],
            &WindowParams::default(),
        );
        assert_eq!(windows, vec![ClipWindow::new(25, 105)]);
    }

    #[test]
    fn test_distant_spikes_stay_apart() {
        // [25,55] and [86,116]: 86 > 55 + 30
        let windows = synthesize(
            &[Spike::new(40, 8), Spike::new(101, 8)],
            &WindowParams::default(),
        );
        assert_eq!(
            windows,
            vec![ClipWindow::new(25, 55), ClipWindow::new(86, 116)]
        );
    }

    #[test]
    fn test_contained_window_does_not_shrink() {
        let merged = merge_windows(
            vec![ClipWindow::new(0, 200), ClipWindow::new(50, 60)],
            30,
        );
        assert_eq!(merged, vec![ClipWindow::new(0, 200)]);
    }

    #[test]
    fn test_no_spikes() {
        assert!(synthesize(&[], &WindowParams::default()).is_empty());
    }
}
