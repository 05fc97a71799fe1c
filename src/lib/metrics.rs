//! Long-form interval metrics written as TSV.
//!
//! One row per feature and per group, with the bounds, the width and the name
//! from the reference. Written through [`write_metrics`] so every metrics file
//! shares the same error messages.

use crate::aggregate::CredibleIntervals;
use crate::interval::Interval;
use crate::reference::Reference;
use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decimal places used for floating point metric columns.
pub const FLOAT_PRECISION: usize = 6;

/// A metric type that can be written to a TSV file.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone {
    /// Human-readable name used in error messages.
    fn metric_name() -> &'static str;
}

/// Which level of the hierarchy a row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Feature,
    Group,
}

/// One credible interval with its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalMetric {
    /// Feature or group.
    pub level: Level,
    /// 1-based feature id or 0-based group id.
    pub id: usize,
    /// Feature or group name from the reference.
    pub name: String,
    /// Lower bound.
    pub lower: String,
    /// Upper bound.
    pub upper: String,
    /// `upper - lower`.
    pub width: String,
}

impl Metric for IntervalMetric {
    fn metric_name() -> &'static str {
        "credible interval"
    }
}

impl IntervalMetric {
    fn new(level: Level, id: usize, name: &str, interval: &Interval) -> Self {
        Self {
            level,
            id,
            name: name.to_string(),
            lower: format_float(f64::from(interval.lower)),
            upper: format_float(f64::from(interval.upper)),
            width: format_float(f64::from(interval.width())),
        }
    }
}

/// Format a float with [`FLOAT_PRECISION`] decimal places.
#[must_use]
pub fn format_float(value: f64) -> String {
    format!("{value:.FLOAT_PRECISION$}")
}

/// Build the feature rows followed by the group rows.
#[must_use]
pub fn interval_metrics(reference: &Reference, intervals: &CredibleIntervals) -> Vec<IntervalMetric> {
    let features = reference
        .features()
        .iter()
        .zip(&intervals.features)
        .enumerate()
        .map(|(i, (feature, interval))| IntervalMetric::new(Level::Feature, i + 1, &feature.name, interval));
    let groups = reference
        .group_names()
        .iter()
        .zip(&intervals.groups)
        .enumerate()
        .map(|(g, (name, interval))| IntervalMetric::new(Level::Group, g, name, interval));
    features.chain(groups).collect()
}

/// Write metrics to a TSV file, naming the metric type in any error.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_metrics<P: AsRef<Path>, T: Metric>(path: P, metrics: &[T]) -> Result<()> {
    let path = path.as_ref();
    DelimFile::default()
        .write_tsv(&path, metrics)
        .with_context(|| format!("Failed to write {} metrics: {}", T::metric_name(), path.display()))
}
