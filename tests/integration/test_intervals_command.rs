//! Integration tests for the intervals command.

use std::path::{Path, PathBuf};

use crate::helpers::{
    Fixture, THREE_FEATURES, assert_success, assert_valid_intervals, read_interval_table,
    run_ciquant,
};

/// Write a feature-major matrix whose component `i` holds `columns[i]`.
fn write_matrix(path: &Path, columns: &[Vec<f32>]) {
    let bytes: Vec<u8> = columns.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, bytes).expect("Failed to write matrix");
}

fn intervals_args(fixture: &Fixture, matrix: &Path, prefix: &Path, extra: &[&str]) -> Vec<String> {
    let mut args = vec![
        "intervals".to_string(),
        "--features".to_string(),
        fixture.features.display().to_string(),
        "--sample-matrix".to_string(),
        matrix.display().to_string(),
        "--output".to_string(),
        prefix.display().to_string(),
    ];
    args.extend(extra.iter().map(|s| (*s).to_string()));
    args
}

/// Ten samples per component: with confidence 0.9 at most one may fall outside.
fn ten_sample_matrix() -> Vec<Vec<f32>> {
    vec![
        vec![0.0; 10],
        vec![0.1, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2],
        vec![0.5, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25],
        vec![0.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.75],
    ]
}

#[test]
fn test_intervals_exact_tables() {
    let fixture = Fixture::new(THREE_FEATURES);
    let matrix = fixture.path("samples.bin");
    write_matrix(&matrix, &ten_sample_matrix());
    let prefix = fixture.path("run");

    let output = run_ciquant(intervals_args(&fixture, &matrix, &prefix, &["-C", "0.9"]));
    assert_success(&output, "intervals");

    let features = std::fs::read_to_string(fixture.path("run.feature_ci.txt")).unwrap();
    assert_eq!(features, "0.2\t0.25\t0.5\n0.2\t0.25\t0.75\n");

    // g1 sums: 0.6 once, then 0.45 nine times; g2 is t3 alone.
    let groups = read_interval_table(&fixture.path("run.group_ci.txt"));
    assert!((groups.lower[0] - 0.45).abs() < 1e-6);
    assert!((groups.upper[0] - 0.45).abs() < 1e-6);
    assert!((groups.lower[1] - 0.5).abs() < 1e-12);
    assert!((groups.upper[1] - 0.75).abs() < 1e-12);
}

#[test]
fn test_intervals_thread_count_does_not_change_tables() {
    let rows: Vec<(String, String)> =
        (0..12).map(|i| (format!("t{i}"), format!("g{}", i / 3))).collect();
    let feature_rows: Vec<(&str, &str, u32, u32)> =
        rows.iter().map(|(t, g)| (t.as_str(), g.as_str(), 1000, 1000)).collect();
    let fixture = Fixture::new(&feature_rows);

    let columns: Vec<Vec<f32>> = (0..=12u32)
        .map(|i| (0..40u32).map(|k| ((k * 11 + i * 5) % 19) as f32 / 100.0).collect())
        .collect();
    let matrix = fixture.path("samples.bin");
    write_matrix(&matrix, &columns);

    let run = |threads: &str| -> (String, String) {
        let prefix: PathBuf = fixture.path(&format!("t{threads}"));
        let output = run_ciquant(intervals_args(&fixture, &matrix, &prefix, &["-t", threads]));
        assert_success(&output, "intervals");
        let read = |suffix: &str| {
            std::fs::read_to_string(fixture.path(&format!("t{threads}.{suffix}"))).unwrap()
        };
        (read("feature_ci.txt"), read("group_ci.txt"))
    };

    let single = run("1");
    for threads in ["2", "3", "7"] {
        assert_eq!(run(threads), single, "Tables differ with {threads} threads");
    }
    assert_valid_intervals(&read_interval_table(&fixture.path("t1.feature_ci.txt")), 12);
}

#[test]
fn test_intervals_writes_metrics() {
    let fixture = Fixture::new(THREE_FEATURES);
    let matrix = fixture.path("samples.bin");
    write_matrix(&matrix, &ten_sample_matrix());
    let metrics = fixture.path("run.metrics.tsv");

    let output = run_ciquant(intervals_args(
        &fixture,
        &matrix,
        &fixture.path("run"),
        &["-C", "0.9", "--metrics", metrics.to_str().unwrap()],
    ));
    assert_success(&output, "intervals");

    let content = std::fs::read_to_string(&metrics).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "level\tid\tname\tlower\tupper\twidth");
    assert_eq!(lines[3], "feature\t3\tt3\t0.500000\t0.750000\t0.250000");
    assert_eq!(lines[5], "group\t1\tg2\t0.500000\t0.750000\t0.250000");
    assert_eq!(lines.len(), 6);
}

#[test]
fn test_intervals_rejects_matrix_for_other_reference() {
    let fixture = Fixture::new(THREE_FEATURES);
    let matrix = fixture.path("samples.bin");
    // 5 components x 3 samples = 60 bytes, not a multiple of 4 components x 4 bytes x n.
    write_matrix(&matrix, &vec![vec![0.0; 3]; 5]);

    let output = run_ciquant(intervals_args(&fixture, &matrix, &fixture.path("run"), &[]));
    assert!(!output.status.success());
    assert!(!fixture.path("run.feature_ci.txt").exists());
}
