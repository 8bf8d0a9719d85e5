//! Shot interval construction from cut candidates.

use tracing::warn;

use shotlist_models::ShotInterval;

/// Cuts closer than this to either end of the video are ignored.
pub const EDGE_EPSILON: f64 = 0.05;

/// Turn cut timestamps into contiguous shot intervals covering
/// `[0, duration]`.
///
/// Cuts within [`EDGE_EPSILON`] of either end are discarded, the rest are
/// sorted and deduplicated. Intervals get 1-based indices. At most
/// `max_shots` intervals are returned; extras are dropped from the end.
/// An unknown duration (zero) yields a single `[0, 0]` interval.
pub fn build_shot_intervals(duration: f64, cuts: &[f64], max_shots: usize) -> Vec<ShotInterval> {
    let duration = if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    };

    let mut inner: Vec<f64> = cuts
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t > EDGE_EPSILON && *t < duration - EDGE_EPSILON)
        .collect();
    inner.sort_by(|a, b| a.total_cmp(b));
    inner.dedup();

    let boundaries: Vec<f64> = std::iter::once(0.0)
        .chain(inner)
        .chain(std::iter::once(duration))
        .collect();

    let mut intervals: Vec<ShotInterval> = boundaries
        .windows(2)
        .enumerate()
        .map(|(i, pair)| ShotInterval::new(i + 1, pair[0], pair[1]))
        .collect();

    if intervals.len() > max_shots {
        warn!(
            shots = intervals.len(),
            max_shots,
            "Shot count exceeds cap, dropping trailing shots"
        );
        intervals.truncate(max_shots);
    }

    intervals
}
