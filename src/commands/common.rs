//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Args;
use log::{info, warn};

use ciquant_lib::model::TabularModel;
use ciquant_lib::reference::Reference;
use ciquant_lib::resample::count_vectors_in;
use ciquant_lib::validation::{
    validate_confidence, validate_file_exists, validate_files_exist, validate_positive,
};

/// The feature table describing features, their lengths and their groups.
#[derive(Debug, Clone, Args)]
pub struct ReferenceOptions {
    /// Features TSV with columns name, group, total_length, full_length in feature-id order
    #[arg(short = 'r', long = "features")]
    pub features: PathBuf,
}

impl ReferenceOptions {
    /// Validates that the feature table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist.
    pub fn validate(&self) -> Result<()> {
        validate_file_exists(&self.features, "Features table")?;
        Ok(())
    }

    /// Loads the reference and logs its size.
    pub fn load(&self) -> Result<Reference> {
        let reference = Reference::from_tsv(&self.features)?;
        info!(
            "Loaded {} features in {} groups from {}",
            reference.num_features(),
            reference.num_groups(),
            self.features.display()
        );
        Ok(reference)
    }
}

/// The fitted model: fragment-length distribution and per-feature model weights.
#[derive(Debug, Clone, Args)]
pub struct ModelOptions {
    /// Fragment-length distribution TSV with columns length, probability
    #[arg(short = 'l', long = "fragment-lengths")]
    pub fragment_lengths: PathBuf,

    /// Model weights TSV with columns name, weight in feature-id order
    #[arg(short = 'w', long = "model-weights")]
    pub model_weights: PathBuf,
}

impl ModelOptions {
    /// Validates that both model files exist.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing file.
    pub fn validate(&self) -> Result<()> {
        validate_files_exist(&[
            (&self.fragment_lengths, "Fragment-length distribution"),
            (&self.model_weights, "Model weights"),
        ])?;
        Ok(())
    }

    /// Loads the model against `reference`.
    pub fn load(&self, reference: &Reference) -> Result<TabularModel> {
        TabularModel::load(&self.fragment_lengths, &self.model_weights, reference)
    }
}

/// Count-vector inputs and resampling parameters.
#[derive(Debug, Clone, Args)]
pub struct SamplingOptions {
    /// Count-vector partition files, one vector of M + 1 integers per line
    #[arg(short = 'c', long = "count-vectors", num_args = 1.., required = true)]
    pub count_vectors: Vec<PathBuf>,

    /// Total number of count vectors across all partitions; counted when omitted
    #[arg(long = "num-count-vectors")]
    pub num_count_vectors: Option<u64>,

    /// Samples drawn from each count vector
    #[arg(short = 'n', long = "samples-per-count-vector", default_value_t = 50)]
    pub samples_per_vector: usize,

    /// Memory for staging sample rows before they are written, in megabytes
    #[arg(short = 'm', long = "buffer-memory", default_value_t = 1024)]
    pub memory_mb: u64,

    /// Random seed for reproducibility
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}

impl SamplingOptions {
    /// Validates the partition files and the numeric parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a partition file is missing or a count is zero.
    pub fn validate(&self) -> Result<()> {
        for path in &self.count_vectors {
            validate_file_exists(path, "Count-vector partition")?;
        }
        validate_positive(self.samples_per_vector, "samples-per-count-vector")?;
        if self.memory_mb == 0 {
            bail!("--buffer-memory must be greater than 0");
        }
        if self.num_count_vectors == Some(0) {
            bail!("--num-count-vectors must be greater than 0");
        }
        Ok(())
    }

    /// The declared number of count vectors, or the number found by scanning
    /// the partitions.
    pub fn resolve_count_vectors(&self) -> Result<u64> {
        if let Some(n) = self.num_count_vectors {
            return Ok(n);
        }
        let n = count_vectors_in(&self.count_vectors)?;
        info!("Found {n} count vectors in {} partition(s)", self.count_vectors.len());
        if n == 0 {
            bail!("No count vectors found in the partition files");
        }
        Ok(n)
    }
}

/// Confidence level and output locations for the interval tables.
#[derive(Debug, Clone, Args)]
pub struct IntervalOptions {
    /// Credibility level of the intervals, strictly between 0 and 1
    #[arg(short = 'C', long = "confidence", default_value_t = 0.95)]
    pub confidence: f64,

    /// Output prefix; writes <prefix>.feature_ci.txt and <prefix>.group_ci.txt
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Optional long-form metrics TSV with one row per feature and per group
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,
}

impl IntervalOptions {
    /// Validates the confidence level.
    ///
    /// # Errors
    ///
    /// Returns an error if the confidence is not in (0, 1).
    pub fn validate(&self) -> Result<()> {
        validate_confidence(self.confidence)?;
        Ok(())
    }

    /// Path of the per-feature table.
    #[must_use]
    pub fn feature_table(&self) -> PathBuf {
        with_suffix(&self.output, ".feature_ci.txt")
    }

    /// Path of the per-group table.
    #[must_use]
    pub fn group_table(&self) -> PathBuf {
        with_suffix(&self.output, ".group_ci.txt")
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Threading options for commands.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Number of worker threads
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,
}

impl ThreadingOptions {
    /// Creates threading options with N threads.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        Self { threads }
    }

    /// Validates that at least one thread was requested.
    ///
    /// # Errors
    ///
    /// Returns an error if `--threads` is 0.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.threads, "threads")?;
        Ok(())
    }

    /// Threads to use for resampling `count_vectors` vectors; never more than
    /// there are vectors.
    #[must_use]
    pub fn for_count_vectors(&self, count_vectors: u64) -> usize {
        let threads = self.threads.max(1);
        if (threads as u64) > count_vectors {
            warn!(
                "Number of count vectors ({count_vectors}) is less than number of threads ({threads}); using {count_vectors} thread(s)"
            );
            count_vectors.max(1) as usize
        } else {
            threads
        }
    }
}
