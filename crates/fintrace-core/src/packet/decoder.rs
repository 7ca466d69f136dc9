use serde::{Deserialize, Serialize};

use super::ensemble::{Ensemble, Payload};
use super::layout::{self, TagClass};
use super::parser::{encode_header, encode_payload, parse_fixed, parse_header, parse_text};
use super::sink::{DecodeEvent, DecodeSink, NullSink};

/// Aggregate data-loss counters for one or more decoded buffers.
///
/// # Examples
/// ```
/// use fintrace_core::decode;
///
/// let (ensembles, report) = decode(&[0u8; 50]);
/// assert!(ensembles.is_empty());
/// assert_eq!(report.padding_bytes, 50);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeReport {
    /// Ensembles emitted.
    pub ensembles: u64,
    /// Bytes skipped as padding (tag 0).
    pub padding_bytes: u64,
    /// Header positions whose tag was not recognized.
    pub unknown_tag_count: u64,
    /// Bytes after the last header that could not be decoded.
    pub truncated_bytes: u64,
    /// Buffers that ended inside a record or header.
    pub truncated_records: u64,
    /// Text ensembles decoded with replacement characters.
    pub text_decode_warnings: u64,
}

impl DecodeReport {
    pub fn merge(&mut self, other: &DecodeReport) {
        self.ensembles += other.ensembles;
        self.padding_bytes += other.padding_bytes;
        self.unknown_tag_count += other.unknown_tag_count;
        self.truncated_bytes += other.truncated_bytes;
        self.truncated_records += other.truncated_records;
        self.text_decode_warnings += other.text_decode_warnings;
    }

    pub fn is_clean(&self) -> bool {
        self.unknown_tag_count == 0
            && self.truncated_bytes == 0
            && self.truncated_records == 0
            && self.text_decode_warnings == 0
    }
}

/// Decode every ensemble in `buffer`.
///
/// Never fails: padding and unknown tags are skipped one byte at a time,
/// and a truncated trailing record ends the scan. Anomalies are counted in
/// the returned report.
///
/// # Examples
/// ```
/// use fintrace_core::{Payload, Thermal, decode};
///
/// let buffer = [0x01, 0x00, 0x00, 0x00, 0x0A, 0x00];
/// let (ensembles, report) = decode(&buffer);
/// assert_eq!(ensembles.len(), 1);
/// assert_eq!(ensembles[0].payload, Payload::TempWater(Thermal { temp: 2560, water: 0 }));
/// assert!(report.is_clean());
/// ```
pub fn decode(buffer: &[u8]) -> (Vec<Ensemble>, DecodeReport) {
    decode_with_sink(buffer, &mut NullSink)
}

/// Same as [`decode`], forwarding anomalies to `sink` as they happen.
pub fn decode_with_sink<S: DecodeSink + ?Sized>(
    buffer: &[u8],
    sink: &mut S,
) -> (Vec<Ensemble>, DecodeReport) {
    let mut ensembles = Vec::new();
    let mut report = DecodeReport::default();
    let mut idx = 0usize;

    loop {
        let remaining = buffer.len() - idx;
        if remaining < layout::HEADER_LEN {
            finish_tail(&buffer[idx..], idx, &mut report, sink);
            break;
        }

        let header_offset = idx;
        let header = match parse_header(&buffer[idx..]) {
            Ok(header) => header,
            Err(_) => break,
        };
        idx += layout::HEADER_LEN;
        let body = &buffer[idx..];

        match header.class {
            TagClass::Padding => {
                // Speculative header read; net advance is one byte.
                idx = header_offset + 1;
                report.padding_bytes += 1;
            }
            TagClass::Unknown(tag) => {
                idx = header_offset + 1;
                report.unknown_tag_count += 1;
                sink.event(&DecodeEvent::UnknownTag {
                    offset: header_offset,
                    tag,
                });
            }
            TagClass::Fixed(tag) => {
                let needed = layout::descriptor(tag).map(|d| d.payload_len).unwrap_or(0);
                match parse_fixed(tag, body) {
                    Ok(payload) => {
                        ensembles.push(Ensemble::new(header.timestamp_ds, payload));
                        report.ensembles += 1;
                        idx += needed;
                    }
                    Err(_) => {
                        record_truncation(
                            &mut report,
                            sink,
                            header_offset,
                            Some(tag.value()),
                            needed,
                            body.len(),
                        );
                        break;
                    }
                }
            }
            TagClass::Text => match parse_text(body) {
                Ok(parsed) => {
                    if parsed.lossy {
                        report.text_decode_warnings += 1;
                        sink.event(&DecodeEvent::LossyText {
                            offset: header_offset,
                            len: parsed.consumed - layout::TEXT_LENGTH_LEN,
                        });
                    }
                    ensembles.push(Ensemble::new(header.timestamp_ds, Payload::Text(parsed.text)));
                    report.ensembles += 1;
                    idx += parsed.consumed;
                }
                Err(_) => {
                    let needed = body
                        .first()
                        .map(|len| layout::TEXT_LENGTH_LEN + usize::from(*len))
                        .unwrap_or(layout::TEXT_LENGTH_LEN);
                    record_truncation(
                        &mut report,
                        sink,
                        header_offset,
                        Some(layout::TAG_TEXT),
                        needed,
                        body.len(),
                    );
                    break;
                }
            },
        }
    }

    (ensembles, report)
}

fn finish_tail<S: DecodeSink + ?Sized>(
    tail: &[u8],
    offset: usize,
    report: &mut DecodeReport,
    sink: &mut S,
) {
    if tail.is_empty() {
        return;
    }
    if tail.iter().all(|b| *b == 0) {
        report.padding_bytes += tail.len() as u64;
        return;
    }
    record_truncation(report, sink, offset, None, layout::HEADER_LEN, tail.len());
}

fn record_truncation<S: DecodeSink + ?Sized>(
    report: &mut DecodeReport,
    sink: &mut S,
    offset: usize,
    tag: Option<u8>,
    needed: usize,
    available: usize,
) {
    report.truncated_bytes += available as u64;
    report.truncated_records += 1;
    sink.event(&DecodeEvent::Truncated {
        offset,
        tag,
        needed,
        available,
    });
}

/// Serialize one ensemble to its wire form (header + payload).
pub fn encode(ensemble: &Ensemble) -> Vec<u8> {
    let tag = ensemble.data_type().value();
    let mut out = encode_header(tag, ensemble.timestamp_ds).to_vec();
    out.extend(encode_payload(&ensemble.payload));
    out
}
