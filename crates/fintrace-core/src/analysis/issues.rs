use crate::Issue;
use crate::packet::decoder::DecodeReport;
use crate::packet::sink::DecodeEvent;

pub(crate) const BROKEN_LINE: &str = "FT-BROKEN-LINE";
pub(crate) const UNKNOWN_TAG: &str = "FT-UNKNOWN-TAG";
pub(crate) const TRUNCATED: &str = "FT-TRUNCATED";
pub(crate) const LOSSY_TEXT: &str = "FT-LOSSY-TEXT";

const MAX_EXAMPLES: usize = 3;

/// Keeps the first few event locations for each issue kind.
#[derive(Debug, Default)]
pub(crate) struct IssueCollector {
    record: Option<u64>,
    unknown_tag: Vec<String>,
    truncated: Vec<String>,
    lossy_text: Vec<String>,
}

impl IssueCollector {
    pub(crate) fn set_record(&mut self, record: Option<u64>) {
        self.record = record;
    }

    pub(crate) fn event(&mut self, event: &DecodeEvent) {
        let record = self.record;
        let location = |offset: usize| match record {
            Some(line) => format!("line {line} @ byte {offset}"),
            None => format!("byte {offset}"),
        };
        let (examples, example) = match event {
            DecodeEvent::UnknownTag { offset, tag } => (
                &mut self.unknown_tag,
                format!("tag {tag} at {}", location(*offset)),
            ),
            DecodeEvent::Truncated {
                offset,
                needed,
                available,
                ..
            } => (
                &mut self.truncated,
                format!("{available} of {needed} bytes at {}", location(*offset)),
            ),
            DecodeEvent::LossyText { offset, len } => (
                &mut self.lossy_text,
                format!("{len} bytes at {}", location(*offset)),
            ),
        };
        if examples.len() < MAX_EXAMPLES {
            examples.push(example);
        }
    }
}

pub(crate) fn build_issues(
    totals: &DecodeReport,
    broken_lines: u64,
    collector: IssueCollector,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    if broken_lines > 0 {
        issues.push(Issue {
            id: BROKEN_LINE.to_string(),
            severity: "error".to_string(),
            message: "Record lines failed to de-armor and were skipped".to_string(),
            count: broken_lines,
            examples: Vec::new(),
        });
    }
    if totals.unknown_tag_count > 0 {
        issues.push(Issue {
            id: UNKNOWN_TAG.to_string(),
            severity: "warning".to_string(),
            message: "Unknown type tags skipped during resynchronization".to_string(),
            count: totals.unknown_tag_count,
            examples: collector.unknown_tag,
        });
    }
    if totals.truncated_records > 0 || totals.truncated_bytes > 0 {
        issues.push(Issue {
            id: TRUNCATED.to_string(),
            severity: "warning".to_string(),
            message: format!(
                "Buffers ended mid-record ({} bytes dropped)",
                totals.truncated_bytes
            ),
            count: totals.truncated_records,
            examples: collector.truncated,
        });
    }
    if totals.text_decode_warnings > 0 {
        issues.push(Issue {
            id: LOSSY_TEXT.to_string(),
            severity: "warning".to_string(),
            message: "Text records contained invalid UTF-8".to_string(),
            count: totals.text_decode_warnings,
            examples: collector.lossy_text,
        });
    }
    issues.sort_by(|a, b| {
        severity_rank(&a.severity)
            .cmp(&severity_rank(&b.severity))
            .then_with(|| a.id.cmp(&b.id))
    });
    issues
}

fn severity_rank(severity: &str) -> u8 {
    match severity {
        "error" => 0,
        "warning" => 1,
        _ => 2,
    }
}
