//! Integration tests for the sample command.

use crate::helpers::{
    Fixture, THREE_FEATURES, assert_success, count_vectors, read_sample_matrix, run_ciquant,
};

fn sample_args(fixture: &Fixture, partitions: &[std::path::PathBuf], extra: &[&str]) -> Vec<String> {
    let mut args = vec!["sample".to_string()];
    args.extend(fixture.model_args());
    args.push("--count-vectors".to_string());
    args.extend(partitions.iter().map(|p| p.display().to_string()));
    args.extend(["--sample-matrix".to_string(), fixture.path("samples.bin").display().to_string()]);
    args.extend(extra.iter().map(|s| (*s).to_string()));
    args
}

/// Every sample row is a probability vector over the features; component 0 holds
/// the background fraction and is excluded.
#[test]
fn test_sample_rows_are_normalized() {
    let fixture = Fixture::new(THREE_FEATURES);
    let vectors = count_vectors(6, fixture.num_features);
    let a = fixture.partition("cv.0.txt", &vectors[..4]);
    let b = fixture.partition("cv.1.txt", &vectors[4..]);

    let output = run_ciquant(sample_args(&fixture, &[a, b], &["-n", "25", "-t", "2", "--seed", "3"]));
    assert_success(&output, "sample");

    let columns = read_sample_matrix(&fixture.path("samples.bin"), fixture.num_features + 1);
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[0].len(), 6 * 25);
    for r in 0..columns[0].len() {
        let sum: f64 = columns[1..].iter().map(|c| f64::from(c[r])).sum();
        assert!((sum - 1.0).abs() < 1e-5, "Row {r} sums to {sum}");
        assert!(columns.iter().all(|c| c[r] >= 0.0));
    }
}

/// Features shorter than every fragment never receive abundance.
#[test]
fn test_sample_unobservable_feature_is_zero() {
    let rows = [("t1", "g1", 1000, 1000), ("short", "g1", 80, 80), ("t3", "g2", 1200, 1200)];
    let fixture = Fixture::new(&rows);
    let partition = fixture.partition("cv.txt", &[vec![3, 40, 0, 20], vec![2, 35, 0, 25]]);

    let output = run_ciquant(sample_args(&fixture, &[partition], &["-n", "10"]));
    assert_success(&output, "sample");

    let columns = read_sample_matrix(&fixture.path("samples.bin"), 4);
    assert!(columns[2].iter().all(|&v| v == 0.0));
    assert!(columns[1].iter().all(|&v| v > 0.0));
}

/// A buffer smaller than the matrix (1 MB holds 65,536 four-component rows)
/// flushes mid-run without changing the result.
#[test]
fn test_sample_buffer_size_does_not_change_output() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = fixture.partition("cv.txt", &count_vectors(1400, fixture.num_features));

    let run = |memory: &str| {
        let output = run_ciquant(sample_args(
            &fixture,
            &[partition.clone()],
            &["-n", "50", "-m", memory, "--seed", "99"],
        ));
        assert_success(&output, "sample");
        std::fs::read(fixture.path("samples.bin")).expect("Failed to read matrix")
    };
    assert_eq!(run("1"), run("64"));
}

/// More threads than count vectors is reduced rather than rejected.
#[test]
fn test_sample_reduces_threads_to_count_vectors() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = fixture.partition("cv.txt", &count_vectors(2, fixture.num_features));

    let output = run_ciquant(sample_args(&fixture, &[partition], &["-t", "8", "-n", "5"]));
    assert_success(&output, "sample");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("less than number of threads"), "Missing warning:\n{stderr}");
}

/// A declared vector count that disagrees with the partitions fails the run.
#[test]
fn test_sample_declared_count_mismatch_fails() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = fixture.partition("cv.txt", &count_vectors(3, fixture.num_features));

    let output =
        run_ciquant(sample_args(&fixture, &[partition], &["--num-count-vectors", "5", "-n", "4"]));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("5 were declared"), "Unexpected error:\n{stderr}");
}

/// A run that fails partway leaves nothing for `intervals` to pick up.
#[test]
fn test_sample_failure_leaves_no_matrix() {
    let fixture = Fixture::new(THREE_FEATURES);
    let good = fixture.partition("cv.0.txt", &count_vectors(4, fixture.num_features));
    let bad = fixture.path("cv.1.txt");
    std::fs::write(&bad, "1 2 3 4\n5 6\n").expect("Failed to write partition");

    let output = run_ciquant(sample_args(&fixture, &[good, bad], &["-n", "10", "-t", "2"]));
    assert!(!output.status.success());
    assert!(!fixture.path("samples.bin").exists());
    let leftovers: Vec<_> = std::fs::read_dir(fixture.dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "Unexpected files left behind: {leftovers:?}");
}
