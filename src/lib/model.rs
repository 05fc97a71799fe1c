//! The fitted model as seen by the credible-interval engine.
//!
//! The upstream quantification model is opaque here: all the engine needs is the
//! fragment-length distribution (to derive expected effective lengths) and the
//! per-feature bias-correction weights. [`FittedModel`] is that seam;
//! [`TabularModel`] loads both pieces from TSV files.

use crate::EPSILON;
use crate::errors::CiError;
use crate::reference::Reference;
use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weight assigned to the background (noise) component.
pub const BACKGROUND_WEIGHT: f64 = 1.0;

/// Access to the parts of a fitted model the engine consumes.
pub trait FittedModel {
    /// The fitted fragment-length distribution.
    fn length_distribution(&self) -> &LengthDistribution;

    /// Per-component bias-correction weights, indexed `0..=M`.
    fn model_weights(&self) -> &ModelWeights;
}

/// A discrete fragment-length distribution with support `(lower, upper]`.
///
/// Stores the pmf together with its cdf and the cumulative length-weighted mass
/// `clen[i] = sum_{j <= i} pmf[j] * (lower + j)`. Index 0 corresponds to the
/// exclusive lower bound and always has zero mass.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthDistribution {
    lower: i64,
    upper: i64,
    pmf: Vec<f64>,
    cdf: Vec<f64>,
    clen: Vec<f64>,
}

impl LengthDistribution {
    /// Create a distribution where `probabilities[k]` is the (unnormalized) mass of
    /// length `lower + 1 + k`.
    ///
    /// # Errors
    ///
    /// Returns an error if `lower` is negative, no probabilities are given, any
    /// probability is negative or non-finite, or the total mass is zero.
    pub fn new(lower: i64, probabilities: &[f64]) -> crate::errors::Result<Self> {
        let corrupt = |reason: String| CiError::CorruptModel { reason };
        if lower < 0 {
            return Err(corrupt(format!("fragment length lower bound {lower} is negative")));
        }
        if probabilities.is_empty() {
            return Err(corrupt("fragment length distribution is empty".to_string()));
        }
        if let Some(p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(corrupt(format!("fragment length probability {p} is invalid")));
        }
        let total: f64 = probabilities.iter().sum();
        if total <= 0.0 {
            return Err(corrupt("fragment length distribution has no mass".to_string()));
        }

        let span = probabilities.len();
        let mut pmf = Vec::with_capacity(span + 1);
        pmf.push(0.0);
        pmf.extend(probabilities.iter().map(|p| p / total));

        let mut cdf = vec![0.0; span + 1];
        let mut clen = vec![0.0; span + 1];
        for i in 1..=span {
            cdf[i] = cdf[i - 1] + pmf[i];
            clen[i] = clen[i - 1] + pmf[i] * (lower + i as i64) as f64;
        }

        Ok(Self { lower, upper: lower + span as i64, pmf, cdf, clen })
    }

    /// Build a distribution from `(length, probability)` pairs.
    ///
    /// Lengths must be strictly increasing; gaps between them carry zero mass.
    ///
    /// # Errors
    ///
    /// Returns an error if the pairs are empty, unordered, or start at length 0, or
    /// if [`LengthDistribution::new`] rejects the probabilities.
    pub fn from_pairs(pairs: &[(u32, f64)]) -> crate::errors::Result<Self> {
        let corrupt = |reason: String| CiError::CorruptModel { reason };
        let Some(&(first, _)) = pairs.first() else {
            return Err(corrupt("fragment length distribution is empty".to_string()));
        };
        if first == 0 {
            return Err(corrupt("fragment lengths must be >= 1".to_string()));
        }
        if let Some(w) = pairs.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(corrupt(format!(
                "fragment lengths must be strictly increasing ({} then {})",
                w[0].0, w[1].0
            )));
        }

        let lower = i64::from(first) - 1;
        let last = pairs[pairs.len() - 1].0;
        let mut probabilities = vec![0.0; (last - first + 1) as usize];
        for &(length, p) in pairs {
            probabilities[(length - first) as usize] = p;
        }
        Self::new(lower, &probabilities)
    }

    /// Exclusive lower bound of the support.
    #[must_use]
    pub fn lower(&self) -> i64 {
        self.lower
    }

    /// Inclusive upper bound of the support.
    #[must_use]
    pub fn upper(&self) -> i64 {
        self.upper
    }

    /// Probability of length `lower + i`.
    #[must_use]
    pub fn pmf(&self, i: usize) -> f64 {
        self.pmf[i]
    }

    /// Cumulative probability of lengths up to `lower + i`.
    #[must_use]
    pub fn cdf(&self, i: usize) -> f64 {
        self.cdf[i]
    }

    /// Cumulative length-weighted mass up to `lower + i`.
    #[must_use]
    pub fn clen(&self, i: usize) -> f64 {
        self.clen[i]
    }
}

/// Bias-correction weights for the background (index 0) and every feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelWeights {
    values: Vec<f64>,
}

impl ModelWeights {
    /// Create weights from the per-feature values (feature 1 first). The background
    /// component receives [`BACKGROUND_WEIGHT`].
    ///
    /// # Errors
    ///
    /// Returns an error if any weight is negative or non-finite.
    pub fn from_feature_weights(weights: &[f64]) -> crate::errors::Result<Self> {
        if let Some((i, w)) = weights.iter().enumerate().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(CiError::CorruptModel {
                reason: format!("model weight {w} for feature {} is invalid", i + 1),
            });
        }
        let mut values = Vec::with_capacity(weights.len() + 1);
        values.push(BACKGROUND_WEIGHT);
        values.extend_from_slice(weights);
        Ok(Self { values })
    }

    /// Weight of component `j` (0 = background).
    #[must_use]
    pub fn get(&self, j: usize) -> f64 {
        self.values[j]
    }

    /// Whether component `j` has a usable (non-zero) weight.
    #[must_use]
    pub fn is_weighted(&self, j: usize) -> bool {
        self.values[j] >= EPSILON
    }

    /// Number of components, `M + 1`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed table; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One row of the fragment-length TSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentLengthRecord {
    pub length: u32,
    pub probability: f64,
}

/// One row of the model-weight TSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelWeightRecord {
    pub name: String,
    pub weight: f64,
}

/// A fitted model loaded from TSV files.
#[derive(Debug, Clone)]
pub struct TabularModel {
    lengths: LengthDistribution,
    weights: ModelWeights,
}

impl TabularModel {
    /// Assemble a model from already-built parts.
    #[must_use]
    pub fn new(lengths: LengthDistribution, weights: ModelWeights) -> Self {
        Self { lengths, weights }
    }

    /// Load the fragment-length distribution and model weights, checking that the
    /// weights name exactly the reference's features in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read or parsed, the distribution
    /// is invalid, or the weights disagree with the reference.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        fragment_lengths: P,
        model_weights: Q,
        reference: &Reference,
    ) -> Result<Self> {
        let fragment_lengths = fragment_lengths.as_ref();
        let model_weights = model_weights.as_ref();

        let length_rows: Vec<FragmentLengthRecord> = DelimFile::default()
            .read_tsv(&fragment_lengths)
            .with_context(|| format!("Failed to read fragment lengths: {}", fragment_lengths.display()))?;
        let pairs: Vec<(u32, f64)> = length_rows.iter().map(|r| (r.length, r.probability)).collect();
        let lengths = LengthDistribution::from_pairs(&pairs)
            .with_context(|| format!("Invalid fragment lengths: {}", fragment_lengths.display()))?;

        let weight_rows: Vec<ModelWeightRecord> = DelimFile::default()
            .read_tsv(&model_weights)
            .with_context(|| format!("Failed to read model weights: {}", model_weights.display()))?;
        let weights = weights_for_reference(&weight_rows, reference)
            .with_context(|| format!("Invalid model weights: {}", model_weights.display()))?;

        Ok(Self { lengths, weights })
    }
}

impl FittedModel for TabularModel {
    fn length_distribution(&self) -> &LengthDistribution {
        &self.lengths
    }

    fn model_weights(&self) -> &ModelWeights {
        &self.weights
    }
}

/// Match weight rows against the reference feature by feature.
fn weights_for_reference(
    rows: &[ModelWeightRecord],
    reference: &Reference,
) -> crate::errors::Result<ModelWeights> {
    if rows.len() != reference.num_features() {
        return Err(CiError::FeatureMismatch {
            reason: format!(
                "model has {} features but the reference has {}",
                rows.len(),
                reference.num_features()
            ),
        });
    }
    for (row, feature) in rows.iter().zip(reference.features()) {
        if row.name != feature.name {
            return Err(CiError::FeatureMismatch {
                reason: format!("model feature '{}' does not match reference feature '{}'", row.name, feature.name),
            });
        }
    }
    let values: Vec<f64> = rows.iter().map(|r| r.weight).collect();
    ModelWeights::from_feature_weights(&values)
}
