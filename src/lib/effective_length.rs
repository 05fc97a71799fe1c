//! Expected effective lengths derived from the fitted fragment-length distribution.
//!
//! A feature's effective length is the expected number of positions a fragment
//! drawn from the length distribution can start at. Features too short to be
//! observed get an effective length of exactly zero and are excluded from
//! length normalization downstream.

use crate::EPSILON;
use crate::errors::CiError;
use crate::model::LengthDistribution;
use crate::reference::Feature;

/// Effective lengths below this are treated as unobservable.
pub const MIN_EFFECTIVE_LENGTH: f64 = 1.0;

/// Negative values closer to zero than this are rounding noise and clamp to zero.
const NEGATIVE_TOLERANCE: f64 = 1e-6;

impl LengthDistribution {
    /// Expected effective length of a feature with total length `total` and full
    /// (untruncated) length `full`.
    ///
    /// # Errors
    ///
    /// Returns [`CiError::CorruptModel`] if the result is negative beyond rounding
    /// tolerance, which cannot happen for a valid distribution.
    pub fn expected_effective_length(&self, total: u32, full: u32) -> crate::errors::Result<f64> {
        let (lb, ub) = (self.lower(), self.upper());
        let total = i64::from(total);
        let full = i64::from(full);

        let pos1 = ((total - full + 1).min(ub) - lb).max(0) as usize;
        let pos2 = (total.min(ub) - lb).max(0) as usize;
        if pos2 == 0 {
            return Ok(0.0);
        }

        let eel = full as f64 * self.cdf(pos1) + (self.cdf(pos2) - self.cdf(pos1)) * (total + 1) as f64
            - (self.clen(pos2) - self.clen(pos1));

        if eel < -NEGATIVE_TOLERANCE {
            return Err(CiError::CorruptModel {
                reason: format!(
                    "negative effective length {eel} for total length {total} and full length {full}"
                ),
            });
        }
        Ok(if eel < MIN_EFFECTIVE_LENGTH { 0.0 } else { eel })
    }
}

/// Per-component expected effective lengths, indexed `0..=M` (index 0 is the
/// background and is always zero).
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveLengths {
    values: Vec<f64>,
}

impl EffectiveLengths {
    /// Compute the effective length of every feature.
    ///
    /// # Errors
    ///
    /// Returns an error if any feature yields a corrupt (negative) value.
    pub fn compute(dist: &LengthDistribution, features: &[Feature]) -> crate::errors::Result<Self> {
        let mut values = Vec::with_capacity(features.len() + 1);
        values.push(0.0);
        for feature in features {
            values.push(dist.expected_effective_length(feature.total_length, feature.full_length)?);
        }
        Ok(Self { values })
    }

    /// Wrap precomputed values (index 0 = background).
    ///
    /// # Errors
    ///
    /// Returns an error if the table is empty or contains a negative or non-finite value.
    pub fn from_values(values: Vec<f64>) -> crate::errors::Result<Self> {
        if values.is_empty() {
            return Err(CiError::CorruptModel { reason: "effective length table is empty".to_string() });
        }
        if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite() || **v < 0.0) {
            return Err(CiError::CorruptModel {
                reason: format!("effective length {v} for component {i} is invalid"),
            });
        }
        Ok(Self { values })
    }

    /// Effective length of component `j`.
    #[must_use]
    pub fn get(&self, j: usize) -> f64 {
        self.values[j]
    }

    /// Whether feature `j` can be observed at all.
    #[must_use]
    pub fn is_observable(&self, j: usize) -> bool {
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

    /// Number of features (excluding the background) that cannot be observed.
    #[must_use]
    pub fn num_unobservable(&self) -> usize {
        (1..self.values.len()).filter(|&j| !self.is_observable(j)).count()
    }
}
