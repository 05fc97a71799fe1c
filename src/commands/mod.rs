//! CLI command implementations for ciquant.
//!
//! Each submodule implements one subcommand.
//!
//! # Command Categories
//!
//! ## Sampling
//! - [`sample`] - Resample count vectors into a sample matrix
//!
//! ## Intervals
//! - [`intervals`] - Credible intervals from an existing sample matrix
//! - [`credibility`] - Both phases end to end

// Blanket clippy pedantic allows for command implementations.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::uninlined_format_args
)]

pub mod ci_runner;
pub mod command;
pub mod common;
pub mod credibility;
pub mod intervals;
pub mod sample;
