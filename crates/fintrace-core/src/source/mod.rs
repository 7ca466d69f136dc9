mod sfp;
mod sfr;

use std::fmt;
use std::path::Path;

pub use sfp::SfpFileSource;
pub use sfr::SfrFileSource;

use thiserror::Error;

/// One raw buffer handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    /// 1-based line number for record files; `None` for binary files.
    pub record: Option<u64>,
    pub bytes: Vec<u8>,
}

pub trait TelemetrySource {
    fn next_buffer(&mut self) -> Result<Option<SourceBuffer>, SourceError>;

    /// Record lines skipped because they failed to de-armor so far.
    fn broken_lines(&self) -> u64 {
        0
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
}

/// File formats a capture can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Armored text, one packet per line.
    Sfr,
    /// Concatenated binary packets.
    Sfp,
    Csv,
}

/// File formats a capture can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Sfp,
    Csv,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Sfr => "sfr",
            InputFormat::Sfp => "sfp",
            InputFormat::Csv => "csv",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "sfr" => Some(InputFormat::Sfr),
            "sfp" => Some(InputFormat::Sfp),
            "csv" => Some(InputFormat::Csv),
            _ => None,
        }
    }

    /// Detect from the file extension (case-insensitive).
    ///
    /// # Examples
    /// ```
    /// use std::path::Path;
    /// use fintrace_core::InputFormat;
    ///
    /// assert_eq!(InputFormat::from_path(Path::new("dive.SFR")), Some(InputFormat::Sfr));
    /// assert_eq!(InputFormat::from_path(Path::new("dive.txt")), None);
    /// ```
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Sfp => "sfp",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "sfp" => Some(OutputFormat::Sfp),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_from_extension() {
        assert_eq!(
            InputFormat::from_path(Path::new("a/b/capture.sfp")),
            Some(InputFormat::Sfp)
        );
        assert_eq!(
            InputFormat::from_path(Path::new("capture.Csv")),
            Some(InputFormat::Csv)
        );
        assert_eq!(InputFormat::from_path(Path::new("capture")), None);
        assert_eq!(
            OutputFormat::from_path(Path::new("out.CSV")),
            Some(OutputFormat::Csv)
        );
        assert_eq!(OutputFormat::from_path(Path::new("out.sfr")), None);
    }
}
