//! Minimum-width empirical credible intervals.
//!
//! Given `n` samples and a confidence level `α`, at most
//! [`outside_threshold`]`(n, α)` samples may fall outside the interval. The
//! estimator sorts the samples and sweeps a two-pointer window over runs of equal
//! values, so an interval boundary never splits a run of ties.

use serde::{Deserialize, Serialize};

/// Slack subtracted before truncating `α * n`, so that exact products do not round up.
const COVERAGE_SLACK: f64 = 1e-8;

/// A closed interval `[lower, upper]` over sample values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f32,
    pub upper: f32,
}

impl Interval {
    /// `upper - lower`.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.upper - self.lower
    }

    /// Whether `value` lies inside the interval.
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Maximum number of the `n` samples allowed outside an interval at `confidence`:
/// `n - (trunc(confidence * n - 1e-8) + 1)`, never negative.
///
/// # Examples
///
/// ```
/// use ciquant_lib::interval::outside_threshold;
///
/// assert_eq!(outside_threshold(100, 0.95), 5);
/// assert_eq!(outside_threshold(100, 0.9), 10);
/// assert_eq!(outside_threshold(3, 0.95), 0);
/// assert_eq!(outside_threshold(1, 0.5), 0);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn outside_threshold(n: usize, confidence: f64) -> usize {
    let inside = (confidence * n as f64 - COVERAGE_SLACK) as i64 + 1;
    (n as i64 - inside).max(0) as usize
}

/// Credible interval of `samples` at `confidence`. The input is left untouched.
///
/// # Panics
///
/// Panics if `samples` is empty.
#[must_use]
pub fn credible_interval(samples: &[f32], confidence: f64) -> Interval {
    let mut sorted = samples.to_vec();
    credible_interval_in_place(&mut sorted, confidence)
}

/// Credible interval of `samples` at `confidence`, sorting `samples` in place.
///
/// # Panics
///
/// Panics if `samples` is empty.
#[must_use]
pub fn credible_interval_in_place(samples: &mut [f32], confidence: f64) -> Interval {
    samples.sort_unstable_by(f32::total_cmp);
    let threshold = outside_threshold(samples.len(), confidence);
    narrowest_window(samples, threshold)
}

/// Two-pointer sweep over sorted `s`. `p` always sits at the first index of a run
/// of equal values and `q` at the last index of one.
fn narrowest_window(s: &[f32], threshold: usize) -> Interval {
    let n = s.len();
    assert!(n > 0, "cannot compute a credible interval of zero samples");

    // Pull the right end in, one run at a time, while the excluded tail still fits.
    let mut q;
    let mut next_q = n as isize - 1;
    loop {
        q = next_q;
        while next_q > 0 && s[next_q as usize - 1] == s[next_q as usize] {
            next_q -= 1;
        }
        next_q -= 1;
        if next_q < 0 || n - (next_q as usize + 1) > threshold {
            break;
        }
    }
    let mut q = q as usize;
    let mut p = 0usize;
    let mut outside = n - (q + 1);

    let mut best = Interval { lower: -1e30, upper: 1e30 };
    loop {
        if s[q] - s[p] < best.upper - best.lower {
            best = Interval { lower: s[p], upper: s[q] };
        }

        let mut next_p = p;
        while next_p < n - 1 && s[next_p] == s[next_p + 1] {
            next_p += 1;
        }
        next_p += 1;

        if next_p <= threshold {
            outside += next_p - p;
            p = next_p;
            while outside > threshold && q < n - 1 {
                let mut next = q + 1;
                while next < n - 1 && s[next] == s[next + 1] {
                    next += 1;
                }
                outside -= next - q;
                q = next;
            }
            debug_assert!(outside <= threshold);
        } else {
            p = next_p;
        }

        if p > threshold {
            break;
        }
    }
    best
}
