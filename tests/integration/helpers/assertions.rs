//! Readers and assertions for `ciquant` output files.

#![allow(dead_code)]

use std::path::Path;

/// Lower and upper bounds read back from an interval table.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTable {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Parse a two-line interval table.
///
/// # Panics
///
/// Panics if the file is missing or does not hold exactly two lines of numbers.
pub fn read_interval_table(path: &Path) -> IntervalTable {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    assert!(content.ends_with('\n'), "Table should end with a newline");
    let lines: Vec<Vec<f64>> = content
        .lines()
        .map(|line| line.split('\t').map(|v| v.parse().expect("Bound should be numeric")).collect())
        .collect();
    assert_eq!(lines.len(), 2, "Table should have a lower and an upper line");
    IntervalTable { lower: lines[0].clone(), upper: lines[1].clone() }
}

/// Asserts that the table has `n` bounds per line, each interval ordered and
/// within `[0, 1]`.
pub fn assert_valid_intervals(table: &IntervalTable, n: usize) {
    assert_eq!(table.lower.len(), n, "Unexpected number of lower bounds");
    assert_eq!(table.upper.len(), n, "Unexpected number of upper bounds");
    for (i, (lo, hi)) in table.lower.iter().zip(&table.upper).enumerate() {
        assert!(lo <= hi, "Interval {i} is inverted: [{lo}, {hi}]");
        assert!(*lo >= 0.0 && *hi <= 1.0 + 1e-6, "Interval {i} is outside [0, 1]: [{lo}, {hi}]");
    }
}

/// Read a feature-major little-endian f32 matrix into one vector per component.
pub fn read_sample_matrix(path: &Path, width: usize) -> Vec<Vec<f32>> {
    let bytes = std::fs::read(path).expect("Failed to read sample matrix");
    assert_eq!(bytes.len() % (width * 4), 0, "Matrix is not a whole number of rows");
    let samples = bytes.len() / (width * 4);
    bytes
        .chunks_exact(samples * 4)
        .map(|component| {
            component
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        })
        .collect()
}

/// Asserts that a command finished successfully, printing its stderr otherwise.
pub fn assert_success(output: &std::process::Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}
