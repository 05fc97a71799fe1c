//! Compute credible intervals from an existing sample matrix.

use anyhow::{Context, Result};
use clap::Parser;
use ciquant_lib::logging::{RunSummary, log_run_summary};
use ciquant_lib::sample_matrix::SampleMatrixLayout;
use ciquant_lib::validation::validate_file_exists;
use log::info;
use std::path::PathBuf;

use crate::commands::ci_runner::compute_and_write_intervals;
use crate::commands::command::Command;
use crate::commands::common::{IntervalOptions, ReferenceOptions, ThreadingOptions};

/// Turn a sample matrix into per-feature and per-group credible intervals.
#[derive(Debug, Parser)]
#[command(
    name = "intervals",
    about = "\x1b[38;5;72m[INTERVALS]\x1b[0m      \x1b[36mCompute credible intervals from a sample matrix\x1b[0m",
    long_about = r#"
Compute minimum-width credible intervals from a sample matrix written by
`ciquant sample`.

The number of samples is derived from the size of the matrix and the number of
features in the feature table. For every feature, the narrowest interval that
leaves at most n - (trunc(confidence * n - 1e-8) + 1) samples outside is
reported. For every group, the same is computed over the index-wise sums of its
features' samples.

Two tables are written, each with a line of lower bounds followed by a line of
upper bounds, tab-separated in id order:
  <output>.feature_ci.txt   one value per feature
  <output>.group_ci.txt     one value per group

Example usage:
  ciquant intervals -r features.tsv --sample-matrix samples.bin -o run -C 0.95 -t 4
  ciquant intervals -r features.tsv --sample-matrix samples.bin -o run --metrics run.ci.tsv
"#
)]
pub struct Intervals {
    /// Feature table
    #[command(flatten)]
    pub reference: ReferenceOptions,

    /// Input sample matrix
    #[arg(short = 's', long = "sample-matrix")]
    pub sample_matrix: PathBuf,

    /// Confidence level and outputs
    #[command(flatten)]
    pub intervals: IntervalOptions,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Command for Intervals {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.reference.validate()?;
        validate_file_exists(&self.sample_matrix, "Sample matrix")?;
        self.intervals.validate()?;
        self.threading.validate()?;

        info!("Starting Intervals");
        info!("Sample matrix: {}", self.sample_matrix.display());
        info!("Output prefix: {}", self.intervals.output.display());
        info!("Confidence: {}", self.intervals.confidence);

        let reference = self.reference.load()?;
        let len = std::fs::metadata(&self.sample_matrix)
            .with_context(|| format!("Failed to stat sample matrix: {}", self.sample_matrix.display()))?
            .len();
        let layout = SampleMatrixLayout::from_file_len(reference.num_features() + 1, len)
            .with_context(|| format!("Invalid sample matrix: {}", self.sample_matrix.display()))?;
        info!("Sample matrix holds {} samples per feature", layout.samples());

        let result = compute_and_write_intervals(
            &reference,
            &self.sample_matrix,
            layout,
            &self.intervals,
            &self.threading,
        )?;

        log_run_summary(&RunSummary {
            features: reference.num_features(),
            groups: reference.num_groups(),
            samples: layout.samples(),
            mean_feature_width: Some(result.mean_feature_width()),
            mean_group_width: Some(result.mean_group_width()),
            ..RunSummary::default()
        });
        Ok(())
    }
}
