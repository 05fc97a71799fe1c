//! Shared phase drivers for the sampling and interval commands.
//!
//! `sample`, `intervals` and `credibility` run one or both of these phases; the
//! helpers here keep their logging and output handling identical.

use anyhow::Result;
use ciquant_lib::aggregate::{CredibleIntervals, compute_credible_intervals};
use ciquant_lib::effective_length::EffectiveLengths;
use ciquant_lib::logging::OperationTimer;
use ciquant_lib::metrics::{interval_metrics, write_metrics};
use ciquant_lib::model::FittedModel;
use ciquant_lib::reference::Reference;
use ciquant_lib::resample::{SamplingConfig, SamplingSummary, run_sampling};
use ciquant_lib::sample_matrix::SampleMatrixLayout;
use ciquant_lib::tables::write_interval_table;
use log::{info, warn};
use std::path::Path;

use crate::commands::common::{IntervalOptions, SamplingOptions, ThreadingOptions};

/// Outcome of Phase I.
#[derive(Debug, Clone, Copy)]
pub struct SamplingOutcome {
    pub summary: SamplingSummary,
    pub unobservable_features: usize,
}

/// Compute effective lengths and resample every count vector into `matrix`.
pub fn sample_posterior<M: FittedModel>(
    reference: &Reference,
    model: &M,
    sampling: &SamplingOptions,
    threading: &ThreadingOptions,
    matrix: &Path,
) -> Result<SamplingOutcome> {
    let lengths = EffectiveLengths::compute(model.length_distribution(), reference.features())?;
    let unobservable_features = lengths.num_unobservable();
    if unobservable_features > 0 {
        warn!(
            "{unobservable_features} feature(s) have zero effective length and will receive no abundance"
        );
    }

    let count_vectors = sampling.resolve_count_vectors()?;
    let config = SamplingConfig {
        samples_per_vector: sampling.samples_per_vector,
        memory_mb: sampling.memory_mb,
        threads: threading.for_count_vectors(count_vectors),
        seed: sampling.seed,
    };
    if let Some(seed) = config.seed {
        info!("Random seed: {seed}");
    }

    let timer = OperationTimer::new("Resampling count vectors");
    let summary = run_sampling(
        &sampling.count_vectors,
        count_vectors,
        model.model_weights(),
        &lengths,
        matrix,
        &config,
    )?;
    timer.log_completion(summary.count_vectors);

    Ok(SamplingOutcome { summary, unobservable_features })
}

/// Compute intervals from the matrix at `matrix` and write the tables and the
/// optional metrics file.
pub fn compute_and_write_intervals(
    reference: &Reference,
    matrix: &Path,
    layout: SampleMatrixLayout,
    intervals: &IntervalOptions,
    threading: &ThreadingOptions,
) -> Result<CredibleIntervals> {
    let timer = OperationTimer::new("Computing credible intervals");
    let result = compute_credible_intervals(
        matrix,
        layout,
        reference.groups(),
        intervals.confidence,
        threading.threads,
    )?;
    timer.log_completion(reference.num_groups() as u64);

    let feature_table = intervals.feature_table();
    let group_table = intervals.group_table();
    write_interval_table(&feature_table, &result.features)?;
    write_interval_table(&group_table, &result.groups)?;
    info!("Wrote feature intervals to {}", feature_table.display());
    info!("Wrote group intervals to {}", group_table.display());

    if let Some(path) = &intervals.metrics {
        write_metrics(path, &interval_metrics(reference, &result))?;
        info!("Wrote interval metrics to {}", path.display());
    }
    Ok(result)
}
