//! Draw posterior abundance samples from count vectors into a sample matrix.

use anyhow::Result;
use clap::Parser;
use ciquant_lib::logging::{RunSummary, log_run_summary};
use log::info;
use std::path::PathBuf;

use crate::commands::ci_runner::sample_posterior;
use crate::commands::command::Command;
use crate::commands::common::{ModelOptions, ReferenceOptions, SamplingOptions, ThreadingOptions};

/// Resample count vectors into an on-disk sample matrix.
#[derive(Debug, Parser)]
#[command(
    name = "sample",
    about = "\x1b[38;5;30m[SAMPLING]\x1b[0m       \x1b[36mDraw abundance samples from posterior count vectors\x1b[0m",
    long_about = r#"
Draw abundance samples from posterior count vectors.

Each line of a count-vector partition file holds M + 1 non-negative integers: the
background component followed by one count per feature. For every vector, the
requested number of abundance vectors is drawn from the Dirichlet posterior,
divided by the model weights and by the expected effective lengths, and
renormalized. Features with zero effective length always receive zero.

All samples are written to a single feature-major matrix of little-endian f32
values: component i occupies bytes [i * S * 4, (i + 1) * S * 4) where S is the
total number of samples. The matrix can be turned into credible intervals with
`ciquant intervals`.

Partition files are resampled in parallel, one worker per file. With --seed, the
set of samples and the resulting intervals are reproducible for the same
partition files. With more than one thread the order of rows in the matrix may
still differ between runs.

The matrix is staged in a temporary file beside --sample-matrix and only moved
into place once every sample has been written; a failed run leaves no matrix.

Example usage:
  ciquant sample -r features.tsv -l fraglen.tsv -w weights.tsv \
    -c cv.0.txt cv.1.txt --sample-matrix samples.bin -t 2 --seed 42
"#
)]
pub struct Sample {
    /// Feature table
    #[command(flatten)]
    pub reference: ReferenceOptions,

    /// Fitted model
    #[command(flatten)]
    pub model: ModelOptions,

    /// Count vectors and resampling parameters
    #[command(flatten)]
    pub sampling: SamplingOptions,

    /// Output sample matrix
    #[arg(short = 's', long = "sample-matrix")]
    pub sample_matrix: PathBuf,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Command for Sample {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.reference.validate()?;
        self.model.validate()?;
        self.sampling.validate()?;
        self.threading.validate()?;

        info!("Starting Sample");
        info!("Features: {}", self.reference.features.display());
        info!("Count-vector partitions: {}", self.sampling.count_vectors.len());
        info!("Output: {}", self.sample_matrix.display());

        let reference = self.reference.load()?;
        let model = self.model.load(&reference)?;
        let outcome =
            sample_posterior(&reference, &model, &self.sampling, &self.threading, &self.sample_matrix)?;

        log_run_summary(&RunSummary {
            features: reference.num_features(),
            groups: reference.num_groups(),
            unobservable_features: Some(outcome.unobservable_features),
            count_vectors: Some(outcome.summary.count_vectors),
            samples: outcome.summary.layout.samples(),
            ..RunSummary::default()
        });
        Ok(())
    }
}
