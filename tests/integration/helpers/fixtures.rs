//! Input files for running the `ciquant` binary.
//!
//! A [`Fixture`] owns a scratch directory holding a features table, a
//! fragment-length distribution, model weights and any number of count-vector
//! partitions.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// One row of the features table: name, group, total length, full length.
pub type FeatureRow<'a> = (&'a str, &'a str, u32, u32);

/// Three observable features in two groups.
pub const THREE_FEATURES: &[FeatureRow<'static>] =
    &[("t1", "g1", 1500, 1500), ("t2", "g1", 900, 900), ("t3", "g2", 2000, 1800)];

/// Command for the binary under test.
pub fn ciquant() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ciquant"))
}

/// Run the binary with `args`, panicking if it cannot be spawned.
pub fn run_ciquant<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    ciquant().args(args).output().expect("Failed to run ciquant")
}

/// Scratch directory with model and reference inputs.
pub struct Fixture {
    pub dir: TempDir,
    pub features: PathBuf,
    pub fragment_lengths: PathBuf,
    pub model_weights: PathBuf,
    pub num_features: usize,
}

impl Fixture {
    /// Write a features table for `rows`, unit model weights, and a fragment-length
    /// distribution uniform over 150..=250.
    pub fn new(rows: &[FeatureRow<'_>]) -> Self {
        let weights: Vec<f64> = vec![1.0; rows.len()];
        Self::with_weights(rows, &weights)
    }

    /// Like [`Fixture::new`] with explicit per-feature model weights.
    pub fn with_weights(rows: &[FeatureRow<'_>], weights: &[f64]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");

        let mut features = String::from("name\tgroup\ttotal_length\tfull_length\n");
        for (name, group, total, full) in rows {
            writeln!(features, "{name}\t{group}\t{total}\t{full}").unwrap();
        }
        let mut lengths = String::from("length\tprobability\n");
        for length in 150..=250 {
            writeln!(lengths, "{length}\t1").unwrap();
        }
        let mut model = String::from("name\tweight\n");
        for ((name, ..), weight) in rows.iter().zip(weights) {
            writeln!(model, "{name}\t{weight}").unwrap();
        }

        let features_path = write_file(dir.path(), "features.tsv", &features);
        let fragment_lengths = write_file(dir.path(), "fraglen.tsv", &lengths);
        let model_weights = write_file(dir.path(), "weights.tsv", &model);
        Self {
            dir,
            features: features_path,
            fragment_lengths,
            model_weights,
            num_features: rows.len(),
        }
    }

    /// Path inside the fixture directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a partition file with one line per count vector.
    pub fn partition(&self, name: &str, vectors: &[Vec<u64>]) -> PathBuf {
        let content: String = vectors
            .iter()
            .map(|v| v.iter().map(u64::to_string).collect::<Vec<_>>().join(" ") + "\n")
            .collect();
        write_file(self.dir.path(), name, &content)
    }

    /// Reference and model arguments shared by every subcommand.
    pub fn model_args(&self) -> Vec<String> {
        vec![
            "--features".to_string(),
            self.features.display().to_string(),
            "--fragment-lengths".to_string(),
            self.fragment_lengths.display().to_string(),
            "--model-weights".to_string(),
            self.model_weights.display().to_string(),
        ]
    }
}

/// Write `content` to `dir/name`.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write fixture file");
    path
}

/// Deterministic count vectors of width `num_features + 1`.
pub fn count_vectors(num_vectors: usize, num_features: usize) -> Vec<Vec<u64>> {
    (0..num_vectors)
        .map(|v| (0..=num_features).map(|j| ((v * 7 + j * 13) % 23 + 5) as u64).collect())
        .collect()
}
