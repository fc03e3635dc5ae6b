//! Decoding of append-only, newline-delimited JSON run logs.
//!
//! Each job appends one JSON object per run. Lines that fail to decode or do not
//! describe a run are reported and skipped; they never fail the whole read.

use crate::intel::{RunRecord, RunStatus};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MAX_LINE_BYTES: usize = 256 * 1024;
/// Durations above a week are clamped; no scheduled job runs that long.
pub const MAX_RUN_DURATION_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunLogError {
    #[error("line {line} exceeds max size: {size} > {max}")]
    OversizedLine { line: usize, size: usize, max: usize },
    #[error("line {line} decode failed: {message}")]
    Decode { line: usize, message: String },
    #[error("line {line} is not a run record: {reason}")]
    Shape { line: usize, reason: &'static str },
}

#[derive(Debug, Clone)]
pub struct DecodeReport<T> {
    pub records: Vec<T>,
    pub errors: Vec<RunLogError>,
}

impl<T> Default for DecodeReport<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> DecodeReport<T> {
    fn push_record(&mut self, record: T) {
        self.records.push(record);
    }

    fn push_error(&mut self, error: RunLogError) {
        self.errors.push(error);
    }
}

/// Wire shape of one run line. Older writers use `runAtMs` instead of `ts`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRunLine {
    #[serde(default)]
    ts: Option<f64>,
    #[serde(default)]
    run_at_ms: Option<f64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    duration_ms: Option<f64>,
    #[serde(default, alias = "sessionKey", alias = "sessionId")]
    session_ref: Option<String>,
}

impl RawRunLine {
    fn into_record(self, line: usize) -> Result<RunRecord, RunLogError> {
        let ts = self
            .ts
            .filter(|value| *value > 0.0)
            .or(self.run_at_ms.filter(|value| *value > 0.0))
            .ok_or(RunLogError::Shape {
                line,
                reason: "missing ts/runAtMs",
            })?;
        let status = self
            .status
            .as_deref()
            .and_then(|raw| raw.parse::<RunStatus>().ok())
            .unwrap_or(RunStatus::Error);
        Ok(RunRecord {
            ts: ts as i64,
            status,
            summary: self.summary.unwrap_or_default(),
            duration_ms: self
                .duration_ms
                .filter(|ms| *ms > 0.0)
                .map_or(0, |ms| ms.min(MAX_RUN_DURATION_MS as f64) as u64),
            session_ref: self.session_ref.filter(|value| !value.is_empty()),
        })
    }
}

/// Decodes one log line. `line` is the 1-based position used in error reports.
pub fn decode_run_line(raw: &str, line: usize) -> Result<RunRecord, RunLogError> {
    let raw = raw.trim_end_matches(['\r', '\n']);
    if raw.len() > DEFAULT_MAX_LINE_BYTES {
        return Err(RunLogError::OversizedLine {
            line,
            size: raw.len(),
            max: DEFAULT_MAX_LINE_BYTES,
        });
    }
    let parsed: RawRunLine = serde_json::from_str(raw).map_err(|err| RunLogError::Decode {
        line,
        message: err.to_string(),
    })?;
    parsed.into_record(line)
}

/// Decodes a whole run log, in file order, skipping blank and malformed lines.
pub fn decode_run_log(content: &str) -> DecodeReport<RunRecord> {
    let mut report = DecodeReport::default();
    for (idx, raw) in content.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        match decode_run_line(raw.trim(), idx + 1) {
            Ok(record) => report.push_record(record),
            Err(err) => report.push_error(err),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ts_and_run_at_ms_variants() {
        let content = concat!(
            "{\"ts\":1000,\"status\":\"ok\",\"summary\":\"built\",\"durationMs\":1200}\n",
            "{\"runAtMs\":2000,\"status\":\"error\",\"summary\":\"failed\",\"sessionKey\":\"s-1\"}\n",
        );
        let report = decode_run_log(content);
        assert!(report.errors.is_empty());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].ts, 1000);
        assert_eq!(report.records[0].duration_ms, 1200);
        assert_eq!(report.records[1].ts, 2000);
        assert_eq!(report.records[1].status, RunStatus::Error);
        assert_eq!(report.records[1].session_ref.as_deref(), Some("s-1"));
    }

    #[test]
    fn malformed_lines_are_reported_and_skipped() {
        let content = concat!(
            "{\"ts\":1,\"status\":\"ok\"}\n",
            "{\"ts\":2,\"status\":\n",
            "\n",
            "\"just text\"\n",
            "{\"status\":\"ok\",\"summary\":\"no time\"}\r\n",
            "{\"ts\":5,\"status\":\"skipped\"}\n",
        );
        let report = decode_run_log(content);
        assert_eq!(
            report.records.iter().map(|r| r.ts).collect::<Vec<_>>(),
            vec![1, 5]
        );
        assert_eq!(report.records[1].status, RunStatus::Error);
        assert_eq!(report.errors.len(), 3);
        assert!(matches!(report.errors[0], RunLogError::Decode { line: 2, .. }));
        assert!(matches!(report.errors[2], RunLogError::Shape { line: 5, .. }));
    }

    #[test]
    fn huge_durations_are_clamped() {
        let record = decode_run_line(r#"{"ts":1,"status":"ok","durationMs":1e19}"#, 1)
            .expect("record");
        assert_eq!(record.duration_ms, MAX_RUN_DURATION_MS);
        let record = decode_run_line(r#"{"ts":1,"status":"ok","durationMs":-5}"#, 1)
            .expect("record");
        assert_eq!(record.duration_ms, 0);
    }

    #[test]
    fn unknown_status_reads_as_error() {
        let record = decode_run_line(r#"{"ts":9,"status":"exploded"}"#, 1).expect("record");
        assert_eq!(record.status, RunStatus::Error);
        let record = decode_run_line(r#"{"ts":9}"#, 1).expect("record");
        assert_eq!(record.status, RunStatus::Error);
    }

    #[test]
    fn oversized_line_is_rejected() {
        let huge = format!(
            "{{\"ts\":1,\"status\":\"ok\",\"summary\":\"{}\"}}",
            "x".repeat(DEFAULT_MAX_LINE_BYTES)
        );
        let err = decode_run_line(&huge, 7).expect_err("oversized");
        assert!(matches!(err, RunLogError::OversizedLine { line: 7, .. }));
    }

    #[test]
    fn fully_malformed_file_yields_no_records() {
        let report = decode_run_log("not json\nstill not json\n");
        assert!(report.records.is_empty());
        assert_eq!(report.errors.len(), 2);
    }
}
