use std::path::Path;

use super::{SourceBuffer, SourceError, TelemetrySource};

/// Yields a binary capture as a single buffer.
pub struct SfpFileSource {
    bytes: Option<Vec<u8>>,
}

impl SfpFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Ok(Self {
            bytes: Some(std::fs::read(path)?),
        })
    }
}

impl TelemetrySource for SfpFileSource {
    fn next_buffer(&mut self) -> Result<Option<SourceBuffer>, SourceError> {
        Ok(self.bytes.take().map(|bytes| SourceBuffer {
            record: None,
            bytes,
        }))
    }
}
