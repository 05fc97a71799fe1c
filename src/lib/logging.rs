//! Formatting helpers for log output and the end-of-run summary.

use std::time::{Duration, Instant};

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use ciquant_lib::logging::format_count;
///
/// assert_eq!(format_count(999), "999");
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a fraction (0.0-1.0) as a percentage with `decimals` places.
///
/// # Examples
///
/// ```
/// use ciquant_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0)
}

/// Formats a duration as e.g. "45s", "2m 15s" or "1h 30m".
///
/// # Examples
///
/// ```
/// use ciquant_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rest) = (secs / 60, secs % 60);
        if rest == 0 { format!("{mins}m") } else { format!("{mins}m {rest}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput, falling back to items per minute below one per second.
///
/// # Examples
///
/// ```
/// use ciquant_lib::logging::format_rate;
/// use std::time::Duration;
///
/// assert_eq!(format_rate(1000, Duration::from_secs(1)), "1,000 items/s");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} items/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} items/s", format_count(rate as u64))
    } else {
        format!("{:.1} items/min", count as f64 / (secs / 60.0))
    }
}

/// Numbers reported at the end of a run. Fields that do not apply to a command
/// are left `None` and skipped.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub features: usize,
    pub groups: usize,
    pub unobservable_features: Option<usize>,
    pub count_vectors: Option<u64>,
    pub samples: u64,
    pub mean_feature_width: Option<f64>,
    pub mean_group_width: Option<f64>,
}

/// Log the end-of-run summary.
#[allow(clippy::cast_precision_loss)]
pub fn log_run_summary(summary: &RunSummary) {
    log::info!("Credible Interval Summary:");
    log::info!("  Features: {}", format_count(summary.features as u64));
    log::info!("  Groups: {}", format_count(summary.groups as u64));
    if let Some(unobservable) = summary.unobservable_features {
        let fraction = if summary.features > 0 { unobservable as f64 / summary.features as f64 } else { 0.0 };
        log::info!(
            "  Unobservable features: {} ({})",
            format_count(unobservable as u64),
            format_percent(fraction, 2)
        );
    }
    if let Some(count_vectors) = summary.count_vectors {
        log::info!("  Count vectors: {}", format_count(count_vectors));
    }
    log::info!("  Samples per feature: {}", format_count(summary.samples));
    if let Some(width) = summary.mean_feature_width {
        log::info!("  Mean feature interval width: {width:.6}");
    }
    if let Some(width) = summary.mean_group_width {
        log::info!("  Mean group interval width: {width:.6}");
    }
}

/// Logs the start of an operation on creation and its duration on completion.
///
/// # Examples
///
/// ```no_run
/// use ciquant_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Resampling count vectors");
/// // ... do work ...
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Logs completion with the number of items handled and the rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
