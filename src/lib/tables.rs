//! Writers for the two-line interval tables.
//!
//! Each table has a line of lower bounds followed by a line of upper bounds,
//! tab-separated in id order. Values use the shortest of fixed or scientific
//! notation at six significant digits, matching C's `%.6g`.

use crate::interval::Interval;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Significant digits written for each bound.
pub const SIGNIFICANT_DIGITS: usize = 6;

/// Format `value` like C's `%.{precision}g`.
///
/// # Examples
///
/// ```
/// use ciquant_lib::tables::format_general;
///
/// assert_eq!(format_general(0.000123456789, 6), "0.000123457");
/// assert_eq!(format_general(1234567.0, 6), "1.23457e+06");
/// assert_eq!(format_general(0.5, 6), "0.5");
/// ```
#[must_use]
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.unsigned_abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

/// Strip trailing zeros, and then a trailing point, from a decimal fraction.
fn trim_fraction(s: &str) -> &str {
    if s.contains('.') { s.trim_end_matches('0').trim_end_matches('.') } else { s }
}

/// Write `intervals` as a two-line table, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_interval_table<P: AsRef<Path>>(path: P, intervals: &[Interval]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create interval table: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let line = |bound: fn(&Interval) -> f32| -> String {
        intervals
            .iter()
            .map(|i| format_general(f64::from(bound(i)), SIGNIFICANT_DIGITS))
            .collect::<Vec<_>>()
            .join("\t")
    };
    writeln!(writer, "{}", line(|i| i.lower))
        .and_then(|()| writeln!(writer, "{}", line(|i| i.upper)))
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write interval table: {}", path.display()))?;
    Ok(())
}
