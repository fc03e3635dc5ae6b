//! The fleet-wide event ticker, newest first.

use crate::jobs::JobOwner;
use crate::run_log::RunSnapshot;
use crate::text::{headline, truncate_chars};
use hq_core::{Roster, TickerEvent, TickerKind};

pub const TICKER_RUNS_PER_JOB: usize = 5;
pub const TICKER_LIMIT: usize = 30;
pub const TICKER_SUMMARY_CHARS: usize = 120;

/// Fleet-wide feed of the most recent runs, newest first.
pub fn build_ticker(runs: &RunSnapshot, roster: &Roster) -> Vec<TickerEvent> {
    let mut events = Vec::new();
    for job_id in runs.job_ids() {
        let owner = JobOwner::resolve(roster, job_id);
        for run in runs.recent(job_id, TICKER_RUNS_PER_JOB) {
            events.push(TickerEvent {
                ts: run.ts,
                agent_id: owner.agent_id.clone(),
                agent_name: owner.agent_name.clone(),
                emoji: owner.emoji.clone(),
                kind: TickerKind::from(run.status),
                summary: truncate_chars(&headline(&run.summary), TICKER_SUMMARY_CHARS),
            });
        }
    }
    events.sort_by(|left, right| right.ts.cmp(&left.ts));
    events.truncate(TICKER_LIMIT);
    events
}
