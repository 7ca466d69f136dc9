use std::fs;
use std::path::PathBuf;

use fintrace_core::{
    Armor, InputFormat, SfpFileSource, SfrFileSource, SourceError, TelemetrySource, analyze_file,
    decode,
};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

#[test]
fn sfr_source_reads_one_buffer_per_line() {
    let path = repo_root()
        .join("tests")
        .join("golden")
        .join("corrupt")
        .join("input.sfr");
    let mut source = SfrFileSource::open(&path, Armor::Base64Url).unwrap();

    let mut records = Vec::new();
    while let Some(buffer) = source.next_buffer().unwrap() {
        records.push(buffer.record);
    }

    assert_eq!(records, vec![Some(1), Some(3), Some(4)]);
    assert_eq!(source.broken_lines(), 1);
    assert_eq!(source.broken()[0].line, 2);
}

#[test]
fn sfr_source_with_wrong_armor_skips_lines() {
    let path = repo_root()
        .join("tests")
        .join("golden")
        .join("clean")
        .join("input.sfr");
    // The second line uses the url-safe alphabet.
    let mut source = SfrFileSource::open(&path, Armor::Base64).unwrap();
    let mut buffers = 0;
    while source.next_buffer().unwrap().is_some() {
        buffers += 1;
    }
    assert_eq!(buffers, 1);
    assert_eq!(source.broken_lines(), 1);
}

#[test]
fn sfp_source_yields_whole_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.sfp");
    fs::write(&path, [0x01, 0x00, 0x00, 0x00, 0x0A, 0x00]).unwrap();

    let mut source = SfpFileSource::open(&path).unwrap();
    let buffer = source.next_buffer().unwrap().expect("one buffer");
    assert_eq!(buffer.record, None);
    let (ensembles, _) = decode(&buffer.bytes);
    assert_eq!(ensembles.len(), 1);
    assert!(source.next_buffer().unwrap().is_none());

    let report = analyze_file(&path, Armor::default()).unwrap();
    assert_eq!(report.decode.buffers_total, 1);
    assert_eq!(report.input.bytes, 6);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = match SfrFileSource::open(&dir.path().join("missing.sfr"), Armor::Base64Url) {
        Ok(_) => panic!("expected missing file to be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Io(_)));
}

#[test]
fn csv_is_not_an_analysis_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    fs::write(&path, "timestamp,dataType\n").unwrap();
    assert_eq!(InputFormat::from_path(&path), Some(InputFormat::Csv));
    assert!(analyze_file(&path, Armor::Base64Url).is_err());
}
