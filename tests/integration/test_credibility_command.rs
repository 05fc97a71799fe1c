//! Integration tests for the credibility command.

use std::path::PathBuf;

use crate::helpers::{
    Fixture, THREE_FEATURES, assert_success, assert_valid_intervals, count_vectors,
    read_interval_table, read_sample_matrix, run_ciquant,
};

fn credibility_args(fixture: &Fixture, partitions: &[PathBuf], extra: &[&str]) -> Vec<String> {
    let mut args = vec!["credibility".to_string()];
    args.extend(fixture.model_args());
    args.push("--count-vectors".to_string());
    args.extend(partitions.iter().map(|p| p.display().to_string()));
    args.extend(["--output".to_string(), fixture.path("out").display().to_string()]);
    args.extend(extra.iter().map(|s| (*s).to_string()));
    args
}

#[test]
fn test_credibility_end_to_end() {
    let fixture = Fixture::new(THREE_FEATURES);
    let vectors = count_vectors(30, fixture.num_features);
    let partitions: Vec<PathBuf> = vectors
        .chunks(10)
        .enumerate()
        .map(|(i, chunk)| fixture.partition(&format!("cv.{i}.txt"), chunk))
        .collect();

    let output = run_ciquant(credibility_args(
        &fixture,
        &partitions,
        &["-C", "0.9", "-n", "20", "-t", "3", "--seed", "42", "--tmp-dir", fixture.dir.path().to_str().unwrap()],
    ));
    assert_success(&output, "credibility");

    let features = read_interval_table(&fixture.path("out.feature_ci.txt"));
    assert_valid_intervals(&features, 3);
    let groups = read_interval_table(&fixture.path("out.group_ci.txt"));
    assert_valid_intervals(&groups, 2);

    // g2 holds only t3.
    assert!((groups.lower[1] - features.lower[2]).abs() < 1e-6);
    assert!((groups.upper[1] - features.upper[2]).abs() < 1e-6);

    // The scratch directory is cleaned up.
    let dirs = std::fs::read_dir(fixture.dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .count();
    assert_eq!(dirs, 0);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Credible Interval Summary"));
}

#[test]
fn test_credibility_is_reproducible_with_seed() {
    let fixture = Fixture::new(THREE_FEATURES);
    let a = fixture.partition("cv.0.txt", &count_vectors(8, fixture.num_features));
    let b = fixture.partition("cv.1.txt", &count_vectors(5, fixture.num_features));
    let partitions = [a, b];

    let run = || {
        let output =
            run_ciquant(credibility_args(&fixture, &partitions, &["-t", "2", "--seed", "7", "-n", "30"]));
        assert_success(&output, "credibility");
        (
            std::fs::read_to_string(fixture.path("out.feature_ci.txt")).unwrap(),
            std::fs::read_to_string(fixture.path("out.group_ci.txt")).unwrap(),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn test_credibility_keeps_sample_matrix_and_matches_intervals_command() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = fixture.partition("cv.txt", &count_vectors(12, fixture.num_features));
    let matrix = fixture.path("kept.bin");

    let output = run_ciquant(credibility_args(
        &fixture,
        &[partition],
        &["-n", "25", "--seed", "1", "--sample-matrix", matrix.to_str().unwrap()],
    ));
    assert_success(&output, "credibility");
    assert_eq!(read_sample_matrix(&matrix, 4)[0].len(), 12 * 25);

    let output = run_ciquant([
        "intervals",
        "--features",
        fixture.features.to_str().unwrap(),
        "--sample-matrix",
        matrix.to_str().unwrap(),
        "--output",
        fixture.path("again").to_str().unwrap(),
        "--threads",
        "2",
    ]);
    assert_success(&output, "intervals");

    for suffix in ["feature_ci.txt", "group_ci.txt"] {
        let first = std::fs::read_to_string(fixture.path(&format!("out.{suffix}"))).unwrap();
        let second = std::fs::read_to_string(fixture.path(&format!("again.{suffix}"))).unwrap();
        assert_eq!(first, second, "{suffix} differs");
    }
}

/// Model weights shift abundance towards features with smaller weights.
#[test]
fn test_credibility_model_weights_shift_abundance() {
    let rows = [("t1", "g1", 1000, 1000), ("t2", "g2", 1000, 1000)];
    let fixture = Fixture::with_weights(&rows, &[1.0, 100.0]);
    let partition = fixture.partition("cv.txt", &vec![vec![0, 500, 500]; 10]);

    let output = run_ciquant(credibility_args(&fixture, &[partition], &["-n", "20", "--seed", "5"]));
    assert_success(&output, "credibility");

    let features = read_interval_table(&fixture.path("out.feature_ci.txt"));
    assert!(features.lower[0] > 0.9, "t1 should dominate: {features:?}");
    assert!(features.upper[1] < 0.1, "t2 should be suppressed: {features:?}");
}
