//! Shared progress counter for the worker pools.
//!
//! Workers in both phases add to one [`ProgressTracker`]; a log line is written
//! each time the running total crosses a multiple of the interval.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counter that logs at fixed interval boundaries.
///
/// # Example
/// ```
/// use ciquant_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Resampled count vectors").with_interval(100);
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Resampled count vectors 250 (complete)"
/// assert_eq!(tracker.count(), 250);
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker with a count of zero and an interval of 10,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 10_000, message: message.into(), count: AtomicU64::new(0) }
    }

    /// Set the logging interval. Zero is treated as one.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Add `additional` to the count, logging once for every interval boundary
    /// crossed. Returns whether the new total sits exactly on a boundary.
    pub fn log_if_needed(&self, additional: u64) -> bool {
        if additional == 0 {
            let count = self.count.load(Ordering::Relaxed);
            return count > 0 && count.is_multiple_of(self.interval);
        }

        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let total = prev + additional;
        for boundary in (prev / self.interval + 1)..=(total / self.interval) {
            info!("{} {}", self.message, boundary * self.interval);
        }
        total.is_multiple_of(self.interval)
    }

    /// Log the final total unless the last update already landed on a boundary.
    pub fn log_final(&self) {
        if !self.log_if_needed(0) {
            let count = self.count.load(Ordering::Relaxed);
            if count > 0 {
                info!("{} {} (complete)", self.message, count);
            }
        }
    }

    /// Current total.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
