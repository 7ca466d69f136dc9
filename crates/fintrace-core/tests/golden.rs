use std::fs;
use std::path::Path;

use fintrace_core::{Armor, Report, analyze_file};

fn load_expected_report(dir: &str) -> Report {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    let expected_path = root.join(dir).join("expected_report.json");

    let expected_json = fs::read_to_string(&expected_path).expect("read expected_report.json");
    serde_json::from_str(&expected_json).expect("parse expected report")
}

fn run_golden(dir: &str) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    let input = root.join(dir).join("input.sfr");
    let expected = load_expected_report(dir);

    let mut actual = analyze_file(&input, Armor::Base64Url).expect("analyze capture");
    actual.input.path = expected.input.path.clone();

    let actual_value = serde_json::to_value(actual).expect("serialize actual");
    let expected_value = serde_json::to_value(expected).expect("serialize expected");

    assert_eq!(actual_value, expected_value, "golden mismatch in {dir}");
}

#[test]
fn golden_clean() {
    run_golden("tests/golden/clean");
}

#[test]
fn golden_clean_uses_epoch_for_generated_at() {
    let report = load_expected_report("tests/golden/clean");
    assert_eq!(report.generated_at, "2020-09-13T12:26:40Z");
    assert!(report.issues.is_empty());
}

#[test]
fn golden_corrupt() {
    run_golden("tests/golden/corrupt");
}

#[test]
fn golden_corrupt_has_every_issue() {
    let report = load_expected_report("tests/golden/corrupt");
    let ids: Vec<&str> = report.issues.iter().map(|issue| issue.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["FT-BROKEN-LINE", "FT-LOSSY-TEXT", "FT-TRUNCATED", "FT-UNKNOWN-TAG"]
    );
    assert_eq!(report.decode.counters.truncated_bytes, 10);
    assert_eq!(report.decode.broken_lines, 1);
}

#[test]
fn golden_imu_padding() {
    run_golden("tests/golden/imu_padding");
}
