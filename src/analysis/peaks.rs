//! Spike detection on the first difference of the chat rate.
//!
//! A spike is a local maximum of the derivative. Flat-topped maxima
//! (plateaus) are reported once, at the middle of the flat run.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::rate::{derivative, RateSeries};
use super::DetectionParams;
use crate::domain::Spike;

/// Indices of local maxima in `values`.
///
/// A maximum rises strictly from its left neighbour, may stay flat for a
/// while, and must then fall strictly. Flat runs report their midpoint
/// (floor). The first and last index are never maxima, and a flat run that
/// reaches the last index is not one either.
pub fn local_maxima(values: &[i64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }

    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                let right = ahead - 1;
                peaks.push((i + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// Spikes in a derivative slice with height at least `min_height`.
///
/// `offset` is added to every index so that sub-range results are reported
/// in absolute seconds.
pub fn find_spikes(derivative: &[i64], min_height: i64, offset: u64) -> Vec<Spike> {
    local_maxima(derivative)
        .into_iter()
        .filter(|&i| derivative[i] >= min_height)
        .map(|i| Spike::new(offset + i as u64, derivative[i]))
        .collect()
}

/// Height descending, then second ascending
fn by_rank(a: &Spike, b: &Spike) -> Ordering {
    b.height.cmp(&a.height).then(a.second.cmp(&b.second))
}

/// Sort spikes strongest first
pub fn rank(mut spikes: Vec<Spike>) -> Vec<Spike> {
    spikes.sort_by(by_rank);
    spikes
}

fn top(spikes: Vec<Spike>, n: usize) -> Vec<Spike> {
    let mut ranked = rank(spikes);
    ranked.truncate(n);
    ranked
}

/// Strongest spikes over the whole series
pub fn global_spikes(series: &RateSeries, params: &DetectionParams) -> Vec<Spike> {
    let spikes = find_spikes(&series.derivative(), params.min_height, 0);
    top(spikes, params.global_top)
}

/// Inclusive `[start, end]` segment bounds covering `[0, max_second]`.
///
/// Consecutive segments share their boundary second. A series that only
/// covers second 0 has no segments.
pub fn segment_bounds(max_second: u64, segment_length: u64) -> Vec<(u64, u64)> {
    let step = segment_length.max(1);
    (0..max_second)
        .step_by(step as usize)
        .map(|start| (start, (start + step).min(max_second)))
        .collect()
}

/// Strongest spikes inside each fixed-length segment, detected independently
pub fn segmented_spikes(series: &RateSeries, params: &DetectionParams) -> Vec<Spike> {
    segment_bounds(series.max_second(), params.segment_length)
        .into_iter()
        .flat_map(|(start, end)| {
            let local = derivative(series.slice(start, end));
            top(find_spikes(&local, params.min_height, start), params.segment_top)
        })
        .collect()
}

/// Union of global and per-segment spikes, one per second (highest wins),
/// strongest first
pub fn hybrid_spikes(series: &RateSeries, params: &DetectionParams) -> Vec<Spike> {
    let mut best: BTreeMap<u64, i64> = BTreeMap::new();

    for spike in global_spikes(series, params)
        .into_iter()
        .chain(segmented_spikes(series, params))
    {
        best.entry(spike.second)
            .and_modify(|height| {
                if spike.height > *height {
                    *height = spike.height;
                }
            })
            .or_insert(spike.height);
    }

    rank(
        best.into_iter()
            .map(|(second, height)| Spike::new(second, height))
            .collect(),
    )
}
