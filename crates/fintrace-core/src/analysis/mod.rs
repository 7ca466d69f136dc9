use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::armor::Armor;
use crate::packet::decoder::{DecodeReport, decode_with_sink};
use crate::packet::ensemble::Payload;
use crate::packet::sink::{DecodeEvent, DecodeSink, TracingSink};
use crate::source::{InputFormat, SfpFileSource, SfrFileSource, SourceError, TelemetrySource};
use crate::{DEFAULT_GENERATED_AT, DecodeSummary, Report, make_stub_report};

mod issues;
mod types;

use issues::{IssueCollector, build_issues};
use types::TypeStats;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Decode a `.sfr` or `.sfp` capture and build its report.
pub fn analyze_file(path: &Path, armor: Armor) -> Result<Report, AnalysisError> {
    match InputFormat::from_path(path) {
        Some(InputFormat::Sfr) => analyze_source(path, SfrFileSource::open(path, armor)?),
        Some(InputFormat::Sfp) => analyze_source(path, SfpFileSource::open(path)?),
        Some(InputFormat::Csv) | None => Err(SourceError::UnsupportedFormat(
            path.display().to_string(),
        )
        .into()),
    }
}

pub fn analyze_source<S: TelemetrySource>(
    path: &Path,
    mut source: S,
) -> Result<Report, AnalysisError> {
    let mut totals = DecodeReport::default();
    let mut buffers_total = 0u64;
    let mut types = TypeStats::default();
    let mut collector = IssueCollector::default();
    let mut first_epoch = None;
    let label = path.display().to_string();

    while let Some(buffer) = source.next_buffer()? {
        buffers_total += 1;
        collector.set_record(buffer.record);
        let mut sink = RecordSink {
            tracing: TracingSink::new(label.clone()),
            collector: &mut collector,
        };
        let (ensembles, report) = decode_with_sink(&buffer.bytes, &mut sink);
        totals.merge(&report);
        for ensemble in &ensembles {
            if let (None, Payload::TempWaterEpoch(_, epoch)) = (first_epoch, &ensemble.payload) {
                first_epoch = Some(*epoch);
            }
            types.add(ensemble);
        }
    }
    let broken_lines = source.broken_lines();

    let mut report = make_stub_report(&label, path.metadata()?.len());
    report.generated_at = first_epoch
        .and_then(epoch_to_rfc3339)
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.issues = build_issues(&totals, broken_lines, collector);
    report.decode = DecodeSummary {
        buffers_total,
        broken_lines,
        counters: totals,
    };
    report.types = types.into_summaries();
    Ok(report)
}

/// Fans decode events out to the log and to the issue examples.
struct RecordSink<'a> {
    tracing: TracingSink,
    collector: &'a mut IssueCollector,
}

impl DecodeSink for RecordSink<'_> {
    fn event(&mut self, event: &DecodeEvent) {
        self.tracing.event(event);
        self.collector.event(event);
    }
}

fn epoch_to_rfc3339(epoch: u32) -> Option<String> {
    OffsetDateTime::from_unix_timestamp(i64::from(epoch))
        .ok()
        .and_then(|at| at.format(&Rfc3339).ok())
}
