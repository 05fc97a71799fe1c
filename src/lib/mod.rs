#![deny(unsafe_code)]
// Clippy lint configuration for CI
// - cast_*: sample counts, byte offsets and f32/f64 values are converted throughout
// - missing_*_doc: documentation improvements tracked separately
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::items_after_statements,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

//! # ciquant - credible intervals for posterior abundance estimates
//!
//! Given posterior count vectors from a fitted quantification model, this library
//! draws replicate abundance vectors, stores them in a disk-backed sample matrix,
//! and computes minimum-width credible intervals per feature (transcript) and per
//! group (gene).
//!
//! ## Overview
//!
//! ### Phase I: resampling
//!
//! - **[`effective_length`]** - expected effective lengths from the fragment-length distribution
//! - **[`resample`]** - Dirichlet-by-Gamma resampling with model-weight and length correction
//! - **[`sample_buffer`]** - memory-bounded, disk-backed sink for sample rows
//!
//! ### Phase II: intervals
//!
//! - **[`interval`]** - minimum-width empirical credible intervals with exact tie handling
//! - **[`partition`]** - balanced contiguous group ranges per worker
//! - **[`aggregate`]** - per-feature and per-group intervals from the sample matrix
//! - **[`tables`]** - the two-line interval tables
//!
//! ### Inputs and utilities
//!
//! - **[`reference`][mod@reference]** - features, lengths and the feature-to-group index
//! - **[`model`]** - the fitted model seam ([`model::FittedModel`])
//! - **[`sample_matrix`]** - byte layout and per-feature reader of the sample matrix
//! - **[`metrics`]** - long-form interval metrics TSV
//! - **[`validation`]**, **[`progress`]**, **[`logging`]**, **[`rng`]**, **[`errors`]**
//!
//! ## Quick Start
//!
//! ```
//! use ciquant_lib::interval::{credible_interval, outside_threshold};
//!
//! let samples = [0.12, 0.10, 0.11, 0.50, 0.11, 0.09, 0.10, 0.12, 0.11, 0.10];
//! let interval = credible_interval(&samples, 0.8);
//! assert!(interval.lower <= interval.upper);
//! let outside = samples.iter().filter(|&&v| !interval.contains(v)).count();
//! assert!(outside <= outside_threshold(samples.len(), 0.8));
//! ```

pub mod aggregate;
pub mod effective_length;
pub mod errors;
pub mod interval;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod partition;
pub mod progress;
pub mod reference;
pub mod resample;
pub mod rng;
pub mod sample_buffer;
pub mod sample_matrix;
pub mod tables;
pub mod validation;

/// Values below this are treated as zero when normalizing and weighting.
pub const EPSILON: f64 = 1e-300;

pub use aggregate::{CredibleIntervals, compute_credible_intervals};
pub use errors::{CiError, Result};
pub use interval::{Interval, credible_interval};
