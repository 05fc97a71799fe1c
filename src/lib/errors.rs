//! Custom error types for ciquant operations.
//!
//! These cover input-contract and model-contract violations. I/O and thread-pool
//! failures are reported through `anyhow` with the offending path attached.

use thiserror::Error;

/// Result type alias for ciquant operations
pub type Result<T> = std::result::Result<T, CiError>;

/// Error type for ciquant operations
#[derive(Error, Debug)]
pub enum CiError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// Invalid confidence level
    #[error("Invalid confidence level: {value} (must be strictly between 0 and 1)")]
    InvalidConfidence {
        /// The invalid confidence value
        value: f64,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "features", "count vector")
        file_type: String,
        /// Path to the file, with a line number where one is known
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// The fitted model and the reference disagree about the feature set
    #[error("Model and reference disagree: {reason}")]
    FeatureMismatch {
        /// What differed
        reason: String,
    },

    /// The fitted model produced values that cannot come from a valid model
    #[error("Corrupt model: {reason}")]
    CorruptModel {
        /// What was wrong
        reason: String,
    },

    /// A normalization sum fell below epsilon while resampling a count vector
    #[error("Degenerate count vector at {location}: {stage} sum {sum:e} is below epsilon")]
    DegenerateCountVector {
        /// File and line of the count vector
        location: String,
        /// Which normalization stage failed
        stage: &'static str,
        /// The offending sum
        sum: f64,
    },

    /// A feature with zero effective length carried probability mass
    #[error("Feature {feature} has zero effective length but carries mass {mass:e}")]
    UnobservableMass {
        /// The 1-based feature id
        feature: usize,
        /// The mass it carried after reweighting
        mass: f64,
    },

    /// The number of sample rows written differs from the declared total
    #[error("Expected {expected} sample rows but {actual} were {action}")]
    SampleCountMismatch {
        /// Declared number of rows
        expected: u64,
        /// Rows observed
        actual: u64,
        /// What happened to the rows ("submitted", "written")
        action: &'static str,
    },
}
