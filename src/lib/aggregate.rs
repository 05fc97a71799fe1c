//! Phase II: credible intervals per feature and per group from a finished sample
//! matrix.
//!
//! Groups are split into contiguous ranges (see [`crate::partition`]). Each
//! worker opens its own reader, seeks to the first feature of its range and walks
//! the features in order. A group's pseudo-samples are the index-wise sums of its
//! features' samples. Result vectors are pre-allocated and handed out as disjoint
//! mutable slices, so workers never share output.

use crate::errors::CiError;
use crate::interval::{Interval, credible_interval_in_place};
use crate::partition::partition_groups;
use crate::progress::ProgressTracker;
use crate::reference::GroupIndex;
use crate::sample_matrix::{SampleMatrixLayout, SampleMatrixReader};
use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;
use std::ops::Range;
use std::path::Path;

/// Groups between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Intervals for every feature (index 0 holds feature 1) and every group.
#[derive(Debug, Clone, PartialEq)]
pub struct CredibleIntervals {
    pub features: Vec<Interval>,
    pub groups: Vec<Interval>,
}

impl CredibleIntervals {
    /// Mean interval width over all features.
    #[must_use]
    pub fn mean_feature_width(&self) -> f64 {
        mean_width(&self.features)
    }

    /// Mean interval width over all groups.
    #[must_use]
    pub fn mean_group_width(&self) -> f64 {
        mean_width(&self.groups)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_width(intervals: &[Interval]) -> f64 {
    if intervals.is_empty() {
        return 0.0;
    }
    intervals.iter().map(|i| f64::from(i.width())).sum::<f64>() / intervals.len() as f64
}

/// One worker's share: a range of groups and the output slices it owns.
struct RangeTask<'a> {
    groups: Range<usize>,
    features_out: &'a mut [Interval],
    groups_out: &'a mut [Interval],
}

/// Compute feature and group intervals from the matrix at `path` using up to
/// `threads` workers.
///
/// # Errors
///
/// Returns an error if the layout does not match the group index, the thread
/// pool cannot be built, or reading the matrix fails.
pub fn compute_credible_intervals(
    path: &Path,
    layout: SampleMatrixLayout,
    groups: &GroupIndex,
    confidence: f64,
    threads: usize,
) -> Result<CredibleIntervals> {
    if layout.width() != groups.num_features() + 1 {
        return Err(CiError::FeatureMismatch {
            reason: format!(
                "sample matrix has {} components but the reference has {} features",
                layout.width(),
                groups.num_features()
            ),
        }
        .into());
    }

    let ranges = partition_groups(groups, threads);
    debug!("Group ranges per worker: {ranges:?}");

    let mut features = vec![Interval::default(); groups.num_features()];
    let mut group_intervals = vec![Interval::default(); groups.num_groups()];

    let mut features_rest: &mut [Interval] = &mut features;
    let mut groups_rest: &mut [Interval] = &mut group_intervals;
    let mut tasks = Vec::with_capacity(ranges.len());
    for range in ranges {
        let span = groups.features_in(&range).len();
        let (features_out, rest) = std::mem::take(&mut features_rest).split_at_mut(span);
        features_rest = rest;
        let (groups_out, rest) = std::mem::take(&mut groups_rest).split_at_mut(range.len());
        groups_rest = rest;
        tasks.push(RangeTask { groups: range, features_out, groups_out });
    }

    info!(
        "Computing credible intervals at confidence {} for {} features and {} groups from {} samples using {} worker(s)",
        confidence,
        groups.num_features(),
        groups.num_groups(),
        layout.samples(),
        tasks.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(tasks.len())
        .build()
        .with_context(|| "Failed to create thread pool")?;
    let progress = ProgressTracker::new("Computed group intervals").with_interval(PROGRESS_INTERVAL);

    pool.install(|| {
        tasks
            .into_par_iter()
            .try_for_each(|task| process_range(path, layout, groups, confidence, task, &progress))
    })?;
    drop(pool);
    progress.log_final();

    Ok(CredibleIntervals { features, groups: group_intervals })
}

fn process_range(
    path: &Path,
    layout: SampleMatrixLayout,
    groups: &GroupIndex,
    confidence: f64,
    task: RangeTask<'_>,
    progress: &ProgressTracker,
) -> Result<()> {
    let Some(first_group) = task.groups.clone().next() else {
        return Ok(());
    };
    let mut reader = SampleMatrixReader::open(path, layout)?;
    reader.seek_to_feature(groups.start(first_group) + 1)?;

    let n = layout.samples() as usize;
    let mut samples = vec![0.0f32; n];
    let mut sums = vec![0.0f32; n];
    let mut next_feature = 0;

    for (slot, group) in task.groups.enumerate() {
        sums.fill(0.0);
        for _ in groups.features(group) {
            reader.read_feature(&mut samples)?;
            for (sum, value) in sums.iter_mut().zip(&samples) {
                *sum += value;
            }
            task.features_out[next_feature] = credible_interval_in_place(&mut samples, confidence);
            next_feature += 1;
        }
        task.groups_out[slot] = credible_interval_in_place(&mut sums, confidence);
        progress.log_if_needed(1);
    }
    Ok(())
}
