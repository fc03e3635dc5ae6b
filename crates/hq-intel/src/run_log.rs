//! File-backed run-log reader: one `{job_id}.jsonl` per scheduled job.

use hq_core::run_log::decode_run_log;
use hq_core::RunRecord;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const RUN_LOG_EXTENSION: &str = "jsonl";

#[derive(Debug, Clone)]
pub struct RunLogReader {
    runs_dir: PathBuf,
}

impl RunLogReader {
    pub fn new(runs_dir: impl Into<PathBuf>) -> Self {
        Self {
            runs_dir: runs_dir.into(),
        }
    }

    pub fn runs_dir(&self) -> &Path {
        &self.runs_dir
    }

    pub fn log_path(&self, job_id: &str) -> PathBuf {
        self.runs_dir.join(format!("{job_id}.{RUN_LOG_EXTENSION}"))
    }

    /// Every decodable run in file order. A missing or unreadable log is empty.
    pub fn read_all(&self, job_id: &str) -> Vec<RunRecord> {
        let path = self.log_path(job_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                debug!(job_id, path = %path.display(), error = %err, "run log unreadable");
                return Vec::new();
            }
        };
        let report = decode_run_log(&content);
        if !report.errors.is_empty() {
            debug!(
                job_id,
                skipped = report.errors.len(),
                first_error = %report.errors[0],
                "skipped malformed run log lines"
            );
        }
        report.records
    }

    pub fn latest(&self, job_id: &str) -> Option<RunRecord> {
        self.read_all(job_id).pop()
    }

    /// The last `count` runs, in file order.
    pub fn recent(&self, job_id: &str, count: usize) -> Vec<RunRecord> {
        let mut runs = self.read_all(job_id);
        let skip = runs.len().saturating_sub(count);
        runs.drain(..skip);
        runs
    }

    /// Reads each listed job once so one aggregation pass sees a single consistent view.
    pub fn snapshot(&self, job_ids: &[String]) -> RunSnapshot {
        let runs = job_ids
            .iter()
            .map(|job_id| (job_id.clone(), self.read_all(job_id)))
            .collect();
        RunSnapshot { runs }
    }
}

/// Run histories loaded in memory, keyed by job id in sorted order.
#[derive(Debug, Clone, Default)]
pub struct RunSnapshot {
    runs: BTreeMap<String, Vec<RunRecord>>,
}

impl RunSnapshot {
    pub fn from_runs(runs: BTreeMap<String, Vec<RunRecord>>) -> Self {
        Self { runs }
    }

    pub fn job_ids(&self) -> impl Iterator<Item = &str> {
        self.runs.keys().map(String::as_str)
    }

    pub fn all(&self, job_id: &str) -> &[RunRecord] {
        self.runs.get(job_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn latest(&self, job_id: &str) -> Option<&RunRecord> {
        self.all(job_id).last()
    }

    pub fn recent(&self, job_id: &str, count: usize) -> &[RunRecord] {
        let runs = self.all(job_id);
        &runs[runs.len().saturating_sub(count)..]
    }
}
