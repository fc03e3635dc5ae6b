//! Run history paging and per-job and fleet-wide run statistics.

use crate::jobs::JobIndex;
use crate::run_log::RunLogReader;
use crate::IntelError;
use hq_core::plan::percent;
use hq_core::RunRecord;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub total_runs: u32,
    pub success_count: u32,
    pub error_count: u32,
    pub avg_duration_ms: u64,
    pub success_rate: u32,
}

impl RunStats {
    pub fn from_runs(runs: &[RunRecord]) -> Self {
        let total_runs = runs.len() as u32;
        let success_count = runs.iter().filter(|run| run.status.is_ok()).count() as u32;
        let durations = runs
            .iter()
            .map(|run| run.duration_ms)
            .filter(|ms| *ms > 0)
            .collect::<Vec<_>>();
        Self {
            total_runs,
            success_count,
            error_count: total_runs - success_count,
            avg_duration_ms: rounded_mean(&durations),
            success_rate: percent(success_count, total_runs),
        }
    }
}

/// One page of a job's run history, newest first, with stats over the whole log.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunHistoryPage {
    pub runs: Vec<RunRecord>,
    pub total: u32,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FleetRunStats {
    pub total_jobs: u32,
    pub total_runs: u32,
    pub overall_success_rate: u32,
    pub avg_duration_ms: u64,
    pub job_stats: BTreeMap<String, RunStats>,
}

/// Job ids come from callers and end up in a file path.
pub fn validate_job_id(job_id: &str) -> Result<&str, IntelError> {
    let trimmed = job_id.trim();
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains("..")
        || trimmed.contains('\0')
    {
        return Err(IntelError::InvalidJobId(job_id.to_string()));
    }
    Ok(trimmed)
}

impl RunLogReader {
    pub fn history(&self, job_id: &str, limit: usize, offset: usize) -> RunHistoryPage {
        let runs = self.read_all(job_id);
        let stats = RunStats::from_runs(&runs);
        let total = runs.len() as u32;
        let page = runs.into_iter().rev().skip(offset).take(limit).collect();
        RunHistoryPage {
            runs: page,
            total,
            stats,
        }
    }
}

pub fn fleet_run_stats(index: &JobIndex, reader: &RunLogReader) -> FleetRunStats {
    let mut fleet = FleetRunStats::default();
    let mut success_total = 0;
    let mut job_averages = Vec::new();
    for job_id in index.all_job_ids() {
        let stats = RunStats::from_runs(&reader.read_all(&job_id));
        fleet.total_runs += stats.total_runs;
        success_total += stats.success_count;
        if stats.avg_duration_ms > 0 {
            job_averages.push(stats.avg_duration_ms);
        }
        fleet.job_stats.insert(job_id, stats);
    }
    fleet.total_jobs = fleet.job_stats.len() as u32;
    fleet.overall_success_rate = percent(success_total, fleet.total_runs);
    fleet.avg_duration_ms = rounded_mean(&job_averages);
    fleet
}

fn rounded_mean(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let sum: u128 = values.iter().map(|value| u128::from(*value)).sum();
    (sum as f64 / values.len() as f64).round() as u64
}
