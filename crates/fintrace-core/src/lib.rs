//! Fintrace core library for offline fin telemetry decoding.
//!
//! This crate turns captures pulled off a surf fin sensor into typed
//! ensembles: record sources feed the armor layer, whose raw buffers go
//! through the packet decoder (layout/reader/parser) and the unit converter,
//! and are aggregated into a deterministic report or exported as CSV.
//! Decoding is byte-oriented and side-effect free; all I/O is isolated in
//! `source` and `export` modules. Wire conventions live in `packet::layout`
//! so the parser stays an exhaustive match over a closed set of payloads.
//!
//! Invariants:
//! - The decode scan advances at least one byte per step and never panics.
//! - Raw fields survive unit conversion unchanged; SI fields are only added.
//! - Report outputs are deterministic and stable across runs.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use fintrace_core::{Armor, analyze_file};
//!
//! let report = analyze_file(Path::new("dive.sfr"), Armor::Base64Url)?;
//! println!("ensembles: {}", report.decode.counters.ensembles);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod armor;
pub mod packet;
pub mod units;

mod analysis;
mod export;
mod source;

pub use analysis::{AnalysisError, analyze_file, analyze_source};
pub use armor::{Armor, ArmorError, BrokenLine, RecordBatch, decode_records};
pub use export::table::write_csv;
pub use export::{
    ConvertOptions, ConvertSummary, ExportError, convert_file, crc32, crc32_file, format_crc32,
    sfp_to_csv, sfr_to_csv, sfr_to_sfp,
};
pub use packet::ensemble::{Ensemble, GpsFix, ImuTriad, Payload, RawAccel, RawValue, Thermal};
pub use packet::error::PacketError;
pub use packet::layout::TypeTag;
pub use packet::sink::{DecodeEvent, DecodeSink, NullSink, TracingSink};
pub use packet::{DecodeReport, decode, decode_with_sink, encode, strip_padding};
pub use source::{
    InputFormat, OutputFormat, SfpFileSource, SfrFileSource, SourceBuffer, SourceError,
    TelemetrySource,
};
pub use units::{
    Calibration, CalibrationCorrection, CalibrationError, SensorGroup, SiEnsemble, SiValue,
    convert, reconvert,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the capture carries no epoch record.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Aggregated decode report with deterministic ordering.
///
/// # Examples
/// ```
/// use fintrace_core::make_stub_report;
///
/// let report = make_stub_report("dive.sfr", 123);
/// assert_eq!(report.report_version, fintrace_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp of the first epoch record in the capture.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,

    /// Data-loss counters summed over every buffer.
    pub decode: DecodeSummary,
    /// Per-type summaries sorted by tag value.
    pub types: Vec<TypeSummary>,
    /// Diagnostics sorted by severity and ID.
    pub issues: Vec<Issue>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use fintrace_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "fintrace".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "fintrace");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Decode totals for a capture.
///
/// # Examples
/// ```
/// use fintrace_core::{DecodeReport, DecodeSummary};
///
/// let summary = DecodeSummary {
///     buffers_total: 2,
///     broken_lines: 0,
///     counters: DecodeReport::default(),
/// };
/// let value = serde_json::to_value(&summary).unwrap();
/// assert_eq!(value["ensembles"], 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodeSummary {
    /// Buffers handed to the decoder (one per record line for `.sfr`).
    pub buffers_total: u64,
    /// Record lines that failed to de-armor.
    pub broken_lines: u64,
    #[serde(flatten)]
    pub counters: DecodeReport,
}

/// Counts for one data type.
///
/// # Examples
/// ```
/// use fintrace_core::TypeSummary;
///
/// let summary = TypeSummary {
///     data_type: 1,
///     name: "temp_water".to_string(),
///     count: 3,
///     first_timestamp: 0.0,
///     last_timestamp: 0.2,
/// };
/// assert_eq!(summary.count, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSummary {
    /// Type tag value (1–12, 15).
    pub data_type: u8,
    pub name: String,
    pub count: u64,
    /// Timestamp of the first ensemble of this type, in decode order.
    pub first_timestamp: f64,
    /// Timestamp of the last ensemble of this type, in decode order.
    pub last_timestamp: f64,
}

/// Single capture diagnostic.
///
/// # Examples
/// ```
/// use fintrace_core::Issue;
///
/// let issue = Issue {
///     id: "FT-TRUNCATED".to_string(),
///     severity: "warning".to_string(),
///     message: "Buffers ended mid-record".to_string(),
///     count: 1,
///     examples: vec!["line 3 @ byte 12".to_string()],
/// };
/// assert_eq!(issue.count, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identifier (e.g., `FT-UNKNOWN-TAG`).
    pub id: String,
    /// Severity label (`error` or `warning`).
    pub severity: String,
    pub message: String,
    /// Number of occurrences aggregated into this issue.
    pub count: u64,
    /// At most three example locations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use fintrace_core::make_stub_report;
///
/// let report = make_stub_report("dive.sfr", 123);
/// assert_eq!(report.report_version, fintrace_core::REPORT_VERSION);
/// assert!(report.types.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "fintrace".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        decode: DecodeSummary::default(),
        types: vec![],
        issues: vec![],
    }
}
