//! Phase I: turning posterior count vectors into abundance samples.
//!
//! Each count vector `c` (one integer per component, background first) yields
//! `samples_per_vector` replicate abundance vectors via a Dirichlet-by-Gamma
//! draw, followed by model-weight and effective-length correction. One worker
//! handles one partition file with its own generator; all workers share the
//! read-only tables and the [`SampleBuffer`].

use crate::EPSILON;
use crate::effective_length::EffectiveLengths;
use crate::errors::CiError;
use crate::model::ModelWeights;
use crate::progress::ProgressTracker;
use crate::rng::partition_seeds;
use crate::sample_buffer::SampleBuffer;
use crate::sample_matrix::SampleMatrixLayout;
use anyhow::{Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Count vectors between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 100;

/// Streams count vectors out of one partition file.
///
/// Blank lines are skipped. Every other line must hold exactly `width`
/// non-negative integers separated by whitespace.
pub struct CountVectorReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
    width: usize,
}

impl CountVectorReader {
    /// Open a partition file expecting `width` values per line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, width: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .with_context(|| format!("Failed to open count vector file: {}", path.display()))?;
        Ok(Self { path, lines: BufReader::new(file).lines(), line_number: 0, width })
    }

    /// `path:line` of the most recently read line.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}:{}", self.path.display(), self.line_number)
    }

    /// Read the next count vector, or `None` at end of file.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the line is malformed.
    pub fn next_vector(&mut self) -> Result<Option<Vec<u64>>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            self.line_number += 1;
            let line = line.with_context(|| format!("Failed to read {}", self.location()))?;
            if line.trim().is_empty() {
                continue;
            }
            return self.parse(&line).map(Some);
        }
    }

    fn parse(&self, line: &str) -> Result<Vec<u64>> {
        let malformed = |reason: String| CiError::InvalidFileFormat {
            file_type: "count vector".to_string(),
            path: self.location(),
            reason,
        };
        let mut counts = Vec::with_capacity(self.width);
        for token in line.split_whitespace() {
            let count = token
                .parse::<u64>()
                .map_err(|_| malformed(format!("'{token}' is not a non-negative integer")))?;
            counts.push(count);
        }
        if counts.len() != self.width {
            return Err(malformed(format!("expected {} values, found {}", self.width, counts.len())).into());
        }
        Ok(counts)
    }
}

/// Count the vectors (non-blank lines) across all partition files.
///
/// # Errors
///
/// Returns an error if any file cannot be read.
pub fn count_vectors_in<P: AsRef<Path>>(paths: &[P]) -> Result<u64> {
    let mut total = 0u64;
    for path in paths {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open count vector file: {}", path.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            if !line.trim().is_empty() {
                total += 1;
            }
        }
    }
    Ok(total)
}

/// Draws abundance samples from count vectors using shared read-only tables.
pub struct PosteriorResampler<'a> {
    weights: &'a ModelWeights,
    lengths: &'a EffectiveLengths,
    samples_per_vector: usize,
}

impl<'a> PosteriorResampler<'a> {
    /// # Errors
    ///
    /// Returns an error if the two tables differ in size or `samples_per_vector`
    /// is zero.
    pub fn new(
        weights: &'a ModelWeights,
        lengths: &'a EffectiveLengths,
        samples_per_vector: usize,
    ) -> crate::errors::Result<Self> {
        if weights.len() != lengths.len() {
            return Err(CiError::FeatureMismatch {
                reason: format!(
                    "{} model weights but {} effective lengths",
                    weights.len(),
                    lengths.len()
                ),
            });
        }
        crate::validation::validate_positive(samples_per_vector, "samples-per-count-vector")?;
        Ok(Self { weights, lengths, samples_per_vector })
    }

    /// Number of components per vector (`M + 1`).
    #[must_use]
    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Draw `samples_per_vector` abundance rows from one count vector.
    ///
    /// Component 0 of each row is the background fraction after model-weight
    /// correction. Components `1..=M` are length-normalized abundances summing to
    /// one; features with no effective length are exactly zero.
    ///
    /// # Errors
    ///
    /// Returns an error if a normalization sum falls below epsilon or an
    /// unobservable feature ends up carrying mass. `location` names the source
    /// line in the error.
    pub fn resample(
        &self,
        counts: &[u64],
        location: &str,
        rng: &mut impl Rng,
    ) -> crate::errors::Result<Vec<Vec<f64>>> {
        let width = self.width();
        if counts.len() != width {
            return Err(CiError::InvalidFileFormat {
                file_type: "count vector".to_string(),
                path: location.to_string(),
                reason: format!("expected {width} values, found {}", counts.len()),
            });
        }

        let mut rows = vec![vec![0.0f64; width]; self.samples_per_vector];
        for (j, &count) in counts.iter().enumerate() {
            if count == 0 || (j > 0 && !self.lengths.is_observable(j)) {
                continue;
            }
            let gamma = Gamma::new(count as f64, 1.0).map_err(|e| CiError::InvalidParameter {
                parameter: "count".to_string(),
                reason: format!("{location}: {e}"),
            })?;
            for row in &mut rows {
                row[j] = gamma.sample(rng);
            }
        }

        for row in &mut rows {
            self.normalize(row, location)?;
        }
        Ok(rows)
    }

    /// Steps 2 to 4 on one drawn row, in place.
    fn normalize(&self, theta: &mut [f64], location: &str) -> crate::errors::Result<()> {
        let degenerate = |stage: &'static str, sum: f64| CiError::DegenerateCountVector {
            location: location.to_string(),
            stage,
            sum,
        };

        let sum: f64 = theta.iter().sum();
        if sum < EPSILON {
            return Err(degenerate("gamma draw", sum));
        }
        theta.iter_mut().for_each(|v| *v /= sum);

        let mut sum = 0.0;
        for (j, v) in theta.iter_mut().enumerate() {
            *v = if self.weights.is_weighted(j) { *v / self.weights.get(j) } else { 0.0 };
            sum += *v;
        }
        if sum < EPSILON {
            return Err(degenerate("model weight", sum));
        }
        theta.iter_mut().for_each(|v| *v /= sum);

        let mut denom = 0.0;
        for j in 1..theta.len() {
            if self.lengths.is_observable(j) {
                theta[j] /= self.lengths.get(j);
                denom += theta[j];
            } else {
                if theta[j] >= EPSILON {
                    return Err(CiError::UnobservableMass { feature: j, mass: theta[j] });
                }
                theta[j] = 0.0;
            }
        }
        if denom < EPSILON {
            return Err(degenerate("effective length", denom));
        }
        theta[1..].iter_mut().for_each(|v| *v /= denom);
        Ok(())
    }
}

/// Resample every count vector of one partition file into `buffer`.
/// Returns the number of count vectors processed.
///
/// # Errors
///
/// Returns an error on malformed input, a numerical contract violation, or a
/// buffer write failure.
pub fn resample_partition<P: AsRef<Path>>(
    path: P,
    resampler: &PosteriorResampler<'_>,
    buffer: &SampleBuffer,
    rng: &mut impl Rng,
    progress: &ProgressTracker,
) -> Result<u64> {
    let mut reader = CountVectorReader::open(path.as_ref(), resampler.width())?;
    let mut processed = 0u64;
    while let Some(counts) = reader.next_vector()? {
        let rows = resampler.resample(&counts, &reader.location(), rng)?;
        let rows: Vec<Vec<f32>> =
            rows.into_iter().map(|row| row.into_iter().map(|v| v as f32).collect()).collect();
        buffer.submit(&rows).with_context(|| format!("Failed to buffer samples from {}", reader.location()))?;
        processed += 1;
        progress.log_if_needed(1);
    }
    debug!("Finished {} ({processed} count vectors)", path.as_ref().display());
    Ok(processed)
}

/// Settings for a Phase I run.
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Samples drawn per count vector.
    pub samples_per_vector: usize,
    /// Staging memory for the sample buffer, in megabytes.
    pub memory_mb: u64,
    /// Worker threads.
    pub threads: usize,
    /// Master seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

/// What a Phase I run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSummary {
    pub count_vectors: u64,
    pub layout: SampleMatrixLayout,
}

/// Run Phase I: resample all partitions in parallel into a sample matrix at
/// `output`, which is complete and synced when this returns.
///
/// `count_vectors` is the total number of vectors across `partitions`; it fixes
/// the matrix size.
///
/// # Errors
///
/// Returns an error if the thread pool cannot be built, any partition fails, or
/// the partitions hold a different number of vectors than declared.
pub fn run_sampling<P: AsRef<Path> + Sync>(
    partitions: &[P],
    count_vectors: u64,
    weights: &ModelWeights,
    lengths: &EffectiveLengths,
    output: &Path,
    config: &SamplingConfig,
) -> Result<SamplingSummary> {
    let resampler = PosteriorResampler::new(weights, lengths, config.samples_per_vector)?;
    let layout =
        SampleMatrixLayout::new(resampler.width(), count_vectors * config.samples_per_vector as u64)?;
    let buffer = SampleBuffer::create(output, layout, config.memory_mb)?;
    info!(
        "Resampling {count_vectors} count vectors from {} partition(s) into {} ({} rows buffered)",
        partitions.len(),
        output.display(),
        buffer.capacity_rows()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .with_context(|| "Failed to create thread pool")?;
    let seeds = partition_seeds(config.seed, partitions.len());
    let progress = ProgressTracker::new("Resampled count vectors").with_interval(PROGRESS_INTERVAL);

    let processed: Vec<u64> = pool.install(|| {
        partitions
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(path, &seed)| {
                let mut rng = StdRng::seed_from_u64(seed);
                resample_partition(path, &resampler, &buffer, &mut rng, &progress)
            })
            .collect::<Result<Vec<u64>>>()
    })?;
    drop(pool);
    progress.log_final();

    let total: u64 = processed.iter().sum();
    if total != count_vectors {
        return Err(CiError::SampleCountMismatch {
            expected: layout.samples(),
            actual: total * config.samples_per_vector as u64,
            action: "drawn",
        })
        .with_context(|| format!("Partitions hold {total} count vectors, {count_vectors} were declared"));
    }
    buffer.finalize()?;
    Ok(SamplingSummary { count_vectors: total, layout })
}
