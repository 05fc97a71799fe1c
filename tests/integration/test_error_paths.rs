//! Error path integration tests.
//!
//! These tests verify that invalid inputs fail the run with a non-zero exit
//! status and a message naming the problem.

use crate::helpers::{Fixture, THREE_FEATURES, count_vectors, run_ciquant, write_file};

fn assert_fails_with(args: Vec<String>, needle: &str) {
    let output = run_ciquant(args);
    assert!(!output.status.success(), "Command unexpectedly succeeded");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(needle), "Expected '{needle}' in stderr:\n{stderr}");
}

fn credibility(fixture: &Fixture, partition: &std::path::Path, extra: &[&str]) -> Vec<String> {
    let mut args = vec!["credibility".to_string()];
    args.extend(fixture.model_args());
    args.extend([
        "--count-vectors".to_string(),
        partition.display().to_string(),
        "--output".to_string(),
        fixture.path("out").display().to_string(),
    ]);
    args.extend(extra.iter().map(|s| (*s).to_string()));
    args
}

#[test]
fn test_missing_partition_file() {
    let fixture = Fixture::new(THREE_FEATURES);
    let missing = fixture.path("nope.txt");
    assert_fails_with(credibility(&fixture, &missing, &[]), "File does not exist");
}

#[test]
fn test_confidence_out_of_range() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = fixture.partition("cv.txt", &count_vectors(2, 3));
    for confidence in ["0", "1", "1.5"] {
        assert_fails_with(credibility(&fixture, &partition, &["-C", confidence]), "onfidence");
    }
}

#[test]
fn test_count_vector_with_wrong_width() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = fixture.partition("cv.txt", &[vec![1, 2, 3, 4], vec![1, 2, 3]]);
    assert_fails_with(credibility(&fixture, &partition, &[]), "cv.txt:2");
}

#[test]
fn test_count_vector_with_non_integer() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = write_file(fixture.dir.path(), "cv.txt", "1 2 x 4\n");
    assert_fails_with(credibility(&fixture, &partition, &[]), "cv.txt:1");
}

#[test]
fn test_model_weights_for_other_features() {
    let fixture = Fixture::new(THREE_FEATURES);
    write_file(fixture.dir.path(), "weights.tsv", "name\tweight\nt1\t1\ntX\t1\nt3\t1\n");
    let partition = fixture.partition("cv.txt", &count_vectors(2, 3));
    assert_fails_with(credibility(&fixture, &partition, &[]), "tX");
}

#[test]
fn test_non_contiguous_groups() {
    let rows = [("t1", "g1", 1000, 1000), ("t2", "g2", 1000, 1000), ("t3", "g1", 1000, 1000)];
    let fixture = Fixture::new(&rows);
    let partition = fixture.partition("cv.txt", &count_vectors(2, 3));
    assert_fails_with(credibility(&fixture, &partition, &[]), "not contiguous");
}

#[test]
fn test_zero_samples_per_vector() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = fixture.partition("cv.txt", &count_vectors(2, 3));
    assert_fails_with(credibility(&fixture, &partition, &["-n", "0"]), "samples-per-count-vector");
}

#[test]
fn test_empty_partitions() {
    let fixture = Fixture::new(THREE_FEATURES);
    let partition = write_file(fixture.dir.path(), "cv.txt", "\n\n");
    assert_fails_with(credibility(&fixture, &partition, &[]), "No count vectors");
}

#[test]
fn test_unknown_subcommand() {
    let output = run_ciquant(["quantify"]);
    assert!(!output.status.success());
}
