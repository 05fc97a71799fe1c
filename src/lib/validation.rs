//! Input validation utilities
//!
//! Common validation functions for command-line parameters and input files with
//! consistent error messages. All functions return structured errors from
//! [`crate::errors`].

use crate::errors::{CiError, Result};
use std::path::Path;

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Features table")
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use ciquant_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/features.tsv", "Features table");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(CiError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that multiple files exist
///
/// # Errors
/// Returns an error for the first file that doesn't exist
pub fn validate_files_exist<P: AsRef<Path>>(files: &[(P, &str)]) -> Result<()> {
    for (path, desc) in files {
        validate_file_exists(path, desc)?;
    }
    Ok(())
}

/// Validate that a confidence level lies strictly inside (0, 1)
///
/// # Errors
/// Returns an error if the value is not in the open interval, or is NaN
///
/// # Example
/// ```
/// use ciquant_lib::validation::validate_confidence;
///
/// validate_confidence(0.95).unwrap();
/// assert!(validate_confidence(1.0).is_err());
/// assert!(validate_confidence(0.0).is_err());
/// ```
pub fn validate_confidence(value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(CiError::InvalidConfidence { value })
    }
}

/// Validate that a count parameter is at least one
///
/// # Errors
/// Returns an error if `value` is zero
///
/// # Example
/// ```
/// use ciquant_lib::validation::validate_positive;
///
/// validate_positive(4, "threads").unwrap();
/// assert!(validate_positive(0, "threads").is_err());
/// ```
pub fn validate_positive(value: usize, name: &str) -> Result<()> {
    if value == 0 {
        return Err(CiError::InvalidParameter {
            parameter: name.to_string(),
            reason: "must be >= 1".to_string(),
        });
    }
    Ok(())
}
