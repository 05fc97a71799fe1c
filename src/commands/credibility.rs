//! End-to-end credible intervals: resample count vectors, then compute
//! per-feature and per-group intervals.

use anyhow::{Context, Result};
use clap::Parser;
use ciquant_lib::logging::{OperationTimer, RunSummary, log_run_summary};
use log::info;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::commands::ci_runner::{compute_and_write_intervals, sample_posterior};
use crate::commands::command::Command;
use crate::commands::common::{
    IntervalOptions, ModelOptions, ReferenceOptions, SamplingOptions, ThreadingOptions,
};

/// File name of the sample matrix inside the scratch directory.
const SCRATCH_MATRIX: &str = "samples.bin";

/// Compute credible intervals from posterior count vectors.
#[derive(Debug, Parser)]
#[command(
    name = "credibility",
    about = "\x1b[38;5;72m[INTERVALS]\x1b[0m      \x1b[36mCompute credible intervals from posterior count vectors\x1b[0m",
    long_about = r#"
Compute credible intervals for feature and group abundances from posterior count
vectors.

Runs `ciquant sample` followed by `ciquant intervals`. The sample matrix is
written to a scratch directory and removed when the run finishes, unless
--sample-matrix is given, in which case it is kept at that path.

Inputs:
  --features           features TSV (name, group, total_length, full_length)
  --fragment-lengths   fragment-length distribution TSV (length, probability)
  --model-weights      model weights TSV (name, weight)
  --count-vectors      one or more partition files of count vectors

Outputs:
  <output>.feature_ci.txt   lower bounds line, then upper bounds line, per feature
  <output>.group_ci.txt     the same per group

Example usage:
  ciquant credibility -r features.tsv -l fraglen.tsv -w weights.tsv \
    -c cv.0.txt cv.1.txt -o sample1 -C 0.95 -n 50 -m 1024 -t 4
"#
)]
pub struct Credibility {
    /// Feature table
    #[command(flatten)]
    pub reference: ReferenceOptions,

    /// Fitted model
    #[command(flatten)]
    pub model: ModelOptions,

    /// Count vectors and resampling parameters
    #[command(flatten)]
    pub sampling: SamplingOptions,

    /// Confidence level and outputs
    #[command(flatten)]
    pub intervals: IntervalOptions,

    /// Keep the sample matrix at this path instead of a scratch directory
    #[arg(short = 's', long = "sample-matrix")]
    pub sample_matrix: Option<PathBuf>,

    /// Directory for the scratch sample matrix (defaults to the system temp directory)
    #[arg(long = "tmp-dir")]
    pub tmp_dir: Option<PathBuf>,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Credibility {
    fn scratch_dir(&self) -> Result<TempDir> {
        let dir = match &self.tmp_dir {
            Some(parent) => TempDir::new_in(parent),
            None => TempDir::new(),
        };
        dir.with_context(|| "Failed to create scratch directory for the sample matrix")
    }
}

impl Command for Credibility {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.reference.validate()?;
        self.model.validate()?;
        self.sampling.validate()?;
        self.intervals.validate()?;
        self.threading.validate()?;

        let timer = OperationTimer::new("Computing credibility intervals");
        info!("Starting Credibility");
        info!("Features: {}", self.reference.features.display());
        info!("Count-vector partitions: {}", self.sampling.count_vectors.len());
        info!("Output prefix: {}", self.intervals.output.display());
        info!("Confidence: {}", self.intervals.confidence);

        let reference = self.reference.load()?;
        let model = self.model.load(&reference)?;

        // Dropping the scratch directory removes the matrix.
        let (matrix, scratch) = match &self.sample_matrix {
            Some(path) => (path.clone(), None),
            None => {
                let dir = self.scratch_dir()?;
                (dir.path().join(SCRATCH_MATRIX), Some(dir))
            }
        };
        info!("Sample matrix: {}", matrix.display());

        let outcome = sample_posterior(&reference, &model, &self.sampling, &self.threading, &matrix)?;
        let layout = outcome.summary.layout;
        let result =
            compute_and_write_intervals(&reference, &matrix, layout, &self.intervals, &self.threading)?;
        drop(scratch);

        log_run_summary(&RunSummary {
            features: reference.num_features(),
            groups: reference.num_groups(),
            unobservable_features: Some(outcome.unobservable_features),
            count_vectors: Some(outcome.summary.count_vectors),
            samples: layout.samples(),
            mean_feature_width: Some(result.mean_feature_width()),
            mean_group_width: Some(result.mean_group_width()),
        });
        timer.log_completion(outcome.summary.count_vectors);
        Ok(())
    }
}
