//! ASCII armor for record lines (`.sfr` files).
//!
//! Each line of a record file is one binary packet wrapped in base64,
//! base64url, or base85. Firmware revisions changed the default, so the
//! codec is always chosen by the caller. A bad line never aborts a batch:
//! it is logged, recorded in `RecordBatch::broken_lines`, and skipped.

pub mod base85;
pub mod error;

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

pub use error::ArmorError;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const BASE64: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

/// Record armor codec.
///
/// # Examples
/// ```
/// use fintrace_core::Armor;
///
/// let armor: Armor = "base64url".parse().unwrap();
/// assert_eq!(armor.decode("AQAAAAoA").unwrap(), vec![0x01, 0x00, 0x00, 0x00, 0x0A, 0x00]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Armor {
    Base64,
    #[default]
    Base64Url,
    Base85,
}

impl Armor {
    pub fn decode(&self, line: &str) -> Result<Vec<u8>, ArmorError> {
        let line = line.trim();
        match self {
            Armor::Base64 => decode_base64(&BASE64, line),
            Armor::Base64Url => decode_base64(&BASE64_URL, line),
            Armor::Base85 => base85::decode(line),
        }
    }

    pub fn encode(&self, packet: &[u8]) -> String {
        match self {
            Armor::Base64 => BASE64.encode(packet),
            Armor::Base64Url => BASE64_URL.encode(packet),
            Armor::Base85 => base85::encode(packet),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Armor::Base64 => "base64",
            Armor::Base64Url => "base64url",
            Armor::Base85 => "base85",
        }
    }
}

fn decode_base64(engine: &GeneralPurpose, line: &str) -> Result<Vec<u8>, ArmorError> {
    engine.decode(line).map_err(|err| match err {
        base64::DecodeError::InvalidByte(position, byte) => ArmorError::InvalidCharacter {
            ch: char::from(byte),
            position,
        },
        other => ArmorError::Base64(other.to_string()),
    })
}

impl fmt::Display for Armor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Armor {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "base64" => Ok(Armor::Base64),
            "base64url" => Ok(Armor::Base64Url),
            "base85" => Ok(Armor::Base85),
            other => Err(format!("unknown encoding '{other}'")),
        }
    }
}

/// A record line that failed to de-armor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLine {
    /// 1-based line number.
    pub line: u64,
    pub message: String,
}

/// De-armored packets of a record file, in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatch {
    pub packets: Vec<Vec<u8>>,
    pub broken_lines: Vec<BrokenLine>,
}

/// De-armor every line of `reader`. Blank lines are ignored; malformed
/// lines are skipped and recorded. Only read failures are errors.
pub fn decode_records<R: BufRead>(reader: R, armor: Armor) -> std::io::Result<RecordBatch> {
    let mut batch = RecordBatch::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx as u64 + 1;
        match decode_line(&line, line_no, armor) {
            Some(Ok(packet)) => batch.packets.push(packet),
            Some(Err(broken)) => batch.broken_lines.push(broken),
            None => {}
        }
    }
    Ok(batch)
}

/// Decode one line; `None` for blank lines.
pub(crate) fn decode_line(
    line: &str,
    line_no: u64,
    armor: Armor,
) -> Option<Result<Vec<u8>, BrokenLine>> {
    if line.trim().is_empty() {
        return None;
    }
    Some(armor.decode(line).map_err(|err| {
        tracing::warn!(line = line_no, encoding = %armor, "skipping broken record: {}", err);
        BrokenLine {
            line: line_no,
            message: err.to_string(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_each_codec() {
        let packet = [0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0xFB, 0xFF];
        for armor in [Armor::Base64, Armor::Base64Url, Armor::Base85] {
            let text = armor.encode(&packet);
            assert_eq!(armor.decode(&text).unwrap(), packet, "{armor}");
            assert_eq!(armor.decode(&format!("  {text}\r")).unwrap(), packet);
        }
    }

    #[test]
    fn url_and_standard_alphabets_differ() {
        let packet = [0xFB, 0xFF];
        assert_eq!(Armor::Base64.encode(&packet), "+/8=");
        assert_eq!(Armor::Base64Url.encode(&packet), "-_8=");
        assert!(Armor::Base64Url.decode("+/8=").is_err());
        assert_eq!(Armor::Base64Url.decode("-_8").unwrap(), packet);
    }

    #[test]
    fn invalid_character_is_reported() {
        let err = Armor::Base64Url.decode("AQ*A").unwrap_err();
        assert_eq!(err, ArmorError::InvalidCharacter { ch: '*', position: 2 });
    }

    #[test]
    fn batch_skips_broken_lines() {
        let good = Armor::Base64Url.encode(&[0x17, 0x00, 0x00, 0x74, 0x0E]);
        let input = format!("{good}\n{good}\nAQ!!AAoA\n\n{good}\n{good}\n");
        let batch = decode_records(Cursor::new(input), Armor::Base64Url).unwrap();
        assert_eq!(batch.packets.len(), 4);
        assert_eq!(batch.broken_lines.len(), 1);
        assert_eq!(batch.broken_lines[0].line, 3);
    }

    #[test]
    fn parses_names() {
        assert_eq!("BASE85".parse::<Armor>().unwrap(), Armor::Base85);
        assert_eq!(Armor::default(), Armor::Base64Url);
        assert!("base32".parse::<Armor>().is_err());
    }
}
