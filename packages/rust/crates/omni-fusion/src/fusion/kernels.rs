//! Compute kernels for fusion: RRF term and min-max normalization.
//!
//! Single swap-in points for the formulas.

/// Default RRF smoothing constant (Cormack et al., SIGIR 2009).
pub const DEFAULT_RRF_K: u32 = 60;

/// RRF term: `1 / (rank + k)` for a 1-based `rank`.
#[inline]
#[must_use]
pub fn rrf_term(k: u32, rank: u32) -> f64 {
    1.0 / (f64::from(rank) + f64::from(k))
}

/// Min-max bounds of a score slice, `None` when empty.
#[must_use]
pub fn min_max(scores: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    scores.into_iter().fold(None, |acc, s| match acc {
        None => Some((s, s)),
        Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
    })
}

/// Min-max normalized score: `(score - min) / (max - min)`.
///
/// A zero range (all scores equal) maps every score to 1.
#[inline]
#[must_use]
pub fn min_max_scale(score: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range > 0.0 {
        (score - min) / range
    } else {
        1.0
    }
}
