use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::armor::{self, Armor, BrokenLine};

use super::{SourceBuffer, SourceError, TelemetrySource};

/// Streams de-armored packets from a record file, one per line.
pub struct SfrFileSource {
    lines: std::io::Lines<BufReader<File>>,
    armor: Armor,
    line_no: u64,
    broken: Vec<BrokenLine>,
}

impl SfrFileSource {
    pub fn open(path: &Path, armor: Armor) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            armor,
            line_no: 0,
            broken: Vec::new(),
        })
    }

    pub fn broken(&self) -> &[BrokenLine] {
        &self.broken
    }
}

impl TelemetrySource for SfrFileSource {
    fn next_buffer(&mut self) -> Result<Option<SourceBuffer>, SourceError> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            match armor::decode_line(&line, self.line_no, self.armor) {
                Some(Ok(bytes)) => {
                    return Ok(Some(SourceBuffer {
                        record: Some(self.line_no),
                        bytes,
                    }));
                }
                Some(Err(broken)) => self.broken.push(broken),
                None => {}
            }
        }
        Ok(None)
    }

    fn broken_lines(&self) -> u64 {
        self.broken.len() as u64
    }
}
