//! Diagnostics hook for the decoder.
//!
//! The scan loop never logs; it reports anomalies to a caller-supplied
//! sink and keeps aggregate counters in `DecodeReport`.

/// Recoverable anomaly observed while scanning a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// Tag outside the recognized set; the scan advanced one byte.
    UnknownTag { offset: usize, tag: u8 },
    /// Fewer bytes remain than the record needs; decoding stopped.
    Truncated {
        offset: usize,
        tag: Option<u8>,
        needed: usize,
        available: usize,
    },
    /// Text record with invalid UTF-8, kept with replacement characters.
    LossyText { offset: usize, len: usize },
}

pub trait DecodeSink {
    fn event(&mut self, event: &DecodeEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DecodeSink for NullSink {
    fn event(&mut self, _event: &DecodeEvent) {}
}

/// Forwards events to `tracing`, tagged with the buffer they came from.
#[derive(Debug, Clone)]
pub struct TracingSink {
    label: String,
}

impl TracingSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl DecodeSink for TracingSink {
    fn event(&mut self, event: &DecodeEvent) {
        match event {
            DecodeEvent::UnknownTag { offset, tag } => {
                tracing::debug!(buffer = %self.label, offset, tag, "unknown data type, resyncing");
            }
            DecodeEvent::Truncated {
                offset,
                tag,
                needed,
                available,
            } => {
                tracing::warn!(
                    buffer = %self.label,
                    offset,
                    ?tag,
                    needed,
                    available,
                    "truncated ensemble dropped"
                );
            }
            DecodeEvent::LossyText { offset, len } => {
                tracing::warn!(buffer = %self.label, offset, len, "text ensemble is not valid UTF-8");
            }
        }
    }
}

impl<F> DecodeSink for F
where
    F: FnMut(&DecodeEvent),
{
    fn event(&mut self, event: &DecodeEvent) {
        self(event)
    }
}
