//! File conversion between the capture formats.
//!
//! `.sfr` (armored lines) → `.sfp` (raw packets) → `.csv` (SI table).
//! Decode anomalies never fail a conversion; they are logged through
//! `TracingSink` and counted in the returned summary.

mod checksum;
pub mod table;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

pub use checksum::{crc32, crc32_file, format_crc32};

use crate::armor::Armor;
use crate::packet::decoder::{DecodeReport, decode_with_sink};
use crate::packet::sink::TracingSink;
use crate::packet::strip::strip_padding;
use crate::source::{
    InputFormat, OutputFormat, SfpFileSource, SfrFileSource, SourceError, TelemetrySource,
};
use crate::units::{Calibration, convert};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("conversion from {from} to {to} is not supported")]
    Unsupported {
        from: InputFormat,
        to: OutputFormat,
    },
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub armor: Armor,
    /// Drop padding runs when writing `.sfp`. On by default.
    pub strip_padding: bool,
    pub calibration: Calibration,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            armor: Armor::default(),
            strip_padding: true,
            calibration: Calibration::default(),
        }
    }
}

/// What a conversion read and wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub buffers: u64,
    pub broken_lines: u64,
    pub bytes_written: u64,
    /// Only filled for CSV output.
    pub decode: DecodeReport,
}

/// De-armor a record file into a raw packet file.
pub fn sfr_to_sfp(
    input: &Path,
    output: &Path,
    armor: Armor,
    strip: bool,
) -> Result<ConvertSummary, ExportError> {
    let mut source = SfrFileSource::open(input, armor)?;
    let mut out = BufWriter::new(File::create(output)?);
    let mut summary = ConvertSummary::default();
    while let Some(buffer) = source.next_buffer()? {
        let bytes = if strip {
            strip_padding(&buffer.bytes)
        } else {
            buffer.bytes
        };
        out.write_all(&bytes)?;
        summary.buffers += 1;
        summary.bytes_written += bytes.len() as u64;
    }
    out.flush()?;
    summary.broken_lines = source.broken_lines();
    Ok(summary)
}

pub fn sfr_to_csv(
    input: &Path,
    output: &Path,
    armor: Armor,
    calibration: &Calibration,
) -> Result<ConvertSummary, ExportError> {
    let source = SfrFileSource::open(input, armor)?;
    source_to_csv(input, source, output, calibration)
}

pub fn sfp_to_csv(
    input: &Path,
    output: &Path,
    calibration: &Calibration,
) -> Result<ConvertSummary, ExportError> {
    let source = SfpFileSource::open(input)?;
    source_to_csv(input, source, output, calibration)
}

fn source_to_csv<S: TelemetrySource>(
    input: &Path,
    mut source: S,
    output: &Path,
    calibration: &Calibration,
) -> Result<ConvertSummary, ExportError> {
    let mut sink = TracingSink::new(input.display().to_string());
    let mut summary = ConvertSummary::default();
    let mut ensembles = Vec::new();
    while let Some(buffer) = source.next_buffer()? {
        let (decoded, report) = decode_with_sink(&buffer.bytes, &mut sink);
        ensembles.extend(decoded);
        summary.decode.merge(&report);
        summary.buffers += 1;
    }
    summary.broken_lines = source.broken_lines();

    let rows = convert(&ensembles, calibration);
    let mut out = CountingWriter::new(BufWriter::new(File::create(output)?));
    table::write_csv(&mut out, &rows)?;
    summary.bytes_written = out.written;
    Ok(summary)
}

/// Convert `input` to `output`, dispatching on the format pair. Identical
/// formats copy the file unchanged.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use fintrace_core::{ConvertOptions, InputFormat, OutputFormat, convert_file};
///
/// let summary = convert_file(
///     Path::new("dive.sfr"),
///     InputFormat::Sfr,
///     Path::new("dive.csv"),
///     OutputFormat::Csv,
///     &ConvertOptions::default(),
/// )?;
/// println!("{} ensembles", summary.decode.ensembles);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert_file(
    input: &Path,
    input_type: InputFormat,
    output: &Path,
    output_type: OutputFormat,
    options: &ConvertOptions,
) -> Result<ConvertSummary, ExportError> {
    match (input_type, output_type) {
        (InputFormat::Sfp, OutputFormat::Sfp) | (InputFormat::Csv, OutputFormat::Csv) => {
            let bytes_written = std::fs::copy(input, output)?;
            Ok(ConvertSummary {
                bytes_written,
                ..ConvertSummary::default()
            })
        }
        (InputFormat::Sfr, OutputFormat::Sfp) => {
            sfr_to_sfp(input, output, options.armor, options.strip_padding)
        }
        (InputFormat::Sfr, OutputFormat::Csv) => {
            sfr_to_csv(input, output, options.armor, &options.calibration)
        }
        (InputFormat::Sfp, OutputFormat::Csv) => sfp_to_csv(input, output, &options.calibration),
        (from, to) => Err(ExportError::Unsupported { from, to }),
    }
}

struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::decoder::encode;
    use crate::packet::ensemble::{Ensemble, Payload, Thermal};

    fn thermal(ts: u32, temp: i16) -> Vec<u8> {
        encode(&Ensemble::new(
            ts,
            Payload::TempWater(Thermal { temp, water: 0 }),
        ))
    }

    fn write_sfr(dir: &Path, lines: &[String]) -> std::path::PathBuf {
        let path = dir.join("capture.sfr");
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn sfr_to_sfp_strips_padding() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = thermal(1, 128);
        first.extend([0u8; 7]);
        let second = thermal(2, 256);
        let lines = vec![
            Armor::Base64Url.encode(&first),
            "not base64 !!".to_string(),
            Armor::Base64Url.encode(&second),
        ];
        let input = write_sfr(dir.path(), &lines);
        let output = dir.path().join("capture.sfp");

        let summary = sfr_to_sfp(&input, &output, Armor::Base64Url, true).unwrap();
        assert_eq!(summary.buffers, 2);
        assert_eq!(summary.broken_lines, 1);
        let written = std::fs::read(&output).unwrap();
        assert_eq!(written, [thermal(1, 128), thermal(2, 256)].concat());
        assert_eq!(summary.bytes_written, written.len() as u64);

        sfr_to_sfp(&input, &output, Armor::Base64Url, false).unwrap();
        assert_eq!(std::fs::read(&output).unwrap().len(), 6 + 7 + 6);
    }

    #[test]
    fn sfp_to_csv_writes_si_columns() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("capture.sfp");
        std::fs::write(&input, [thermal(0, 2560), vec![0, 0, 0, 0]].concat()).unwrap();
        let output = dir.path().join("capture.csv");

        let summary = sfp_to_csv(&input, &output, &Calibration::new()).unwrap();
        assert_eq!(summary.decode.ensembles, 1);
        assert_eq!(summary.decode.padding_bytes, 4);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            text,
            "timestamp,dataType,temp,water,Temperature (C),Water Detect\n0.0,1,2560,0,20,false\n"
        );
        assert_eq!(summary.bytes_written, text.len() as u64);
    }

    #[test]
    fn default_options_strip_sfp_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut packet = thermal(4, 512);
        packet.extend([0u8; 5]);
        let options = ConvertOptions {
            armor: Armor::Base64Url,
            ..ConvertOptions::default()
        };
        assert!(options.strip_padding);
        let input = write_sfr(dir.path(), &[options.armor.encode(&packet)]);
        let output = dir.path().join("capture.sfp");

        convert_file(&input, InputFormat::Sfr, &output, OutputFormat::Sfp, &options).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), thermal(4, 512));
    }

    #[test]
    fn convert_dispatches_on_format_pair() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("capture.sfp");
        std::fs::write(&input, thermal(3, 64)).unwrap();

        let copy = dir.path().join("copy.sfp");
        convert_file(
            &input,
            InputFormat::Sfp,
            &copy,
            OutputFormat::Sfp,
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(std::fs::read(&copy).unwrap(), thermal(3, 64));

        let err = convert_file(
            &input,
            InputFormat::Csv,
            &dir.path().join("out.sfp"),
            OutputFormat::Sfp,
            &ConvertOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExportError::Unsupported {
                from: InputFormat::Csv,
                to: OutputFormat::Sfp
            }
        ));
    }
}
