//! Analyzer output decoding and projection onto document lines.
//!
//! The analyzer prints a JSON array of `{line, severity, msg}` records with
//! 1-based line numbers. Output is untrusted: anything that does not decode
//! yields no diagnostics, and records pointing past the end of the current
//! document are dropped one by one.

use serde::{Deserialize, Deserializer};

use crate::document::LineSource;
use crate::types::{RangeDiagnostic, Severity};

/// One record of analyzer output. Lives for a single analysis cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosticRecord {
    /// 1-based line number. Zero and negative values mean the first line.
    #[serde(deserialize_with = "lenient_line")]
    pub line: i64,
    #[serde(default)]
    pub severity: Option<String>,
    pub msg: String,
}

/// Any JSON number is accepted as a line so one odd record cannot reject the
/// whole payload. Out-of-range values saturate; fractional values map past the
/// end of any document and the record is dropped as stale.
#[allow(clippy::float_cmp)]
fn lenient_line<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    Ok(number
        .as_i64()
        .or_else(|| number.as_f64().filter(|f| f.trunc() == *f).map(|f| f as i64))
        .unwrap_or(i64::MAX))
}

/// Decode raw analyzer output, keeping the decode error for logging.
pub fn decode_records(raw: &str) -> Result<Vec<DiagnosticRecord>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Decode and project in one step. Undecodable output yields an empty list.
#[must_use]
pub fn parse<L: LineSource + ?Sized>(raw: &str, lines: &L) -> Vec<RangeDiagnostic> {
    match decode_records(raw) {
        Ok(records) => to_diagnostics(records, lines),
        Err(_) => Vec::new(),
    }
}

/// Project decoded records, preserving their order and skipping stale ones.
#[must_use]
pub fn to_diagnostics<L: LineSource + ?Sized>(
    records: Vec<DiagnosticRecord>,
    lines: &L,
) -> Vec<RangeDiagnostic> {
    records
        .into_iter()
        .filter_map(|record| project(record, lines))
        .collect()
}

/// Range for a single record, or `None` when its line no longer exists.
#[must_use]
pub fn project<L: LineSource + ?Sized>(
    record: DiagnosticRecord,
    lines: &L,
) -> Option<RangeDiagnostic> {
    let index = line_index(record.line)?;
    let text = lines.line_text(index)?;
    // Columns are UTF-16 code units, as editors count them.
    let end_column = text.encode_utf16().count();
    let start_column = if text.chars().all(char::is_whitespace) {
        0
    } else {
        text.chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf16)
            .sum()
    };
    Some(RangeDiagnostic::new(
        Severity::from_analyzer(record.severity.as_deref()),
        record.msg,
        index,
        start_column,
        end_column,
    ))
}

fn line_index(line: i64) -> Option<usize> {
    usize::try_from(line.saturating_sub(1).max(0)).ok()
}
