//! Blocker alerts from the heartbeat report and agents' goal files.

use crate::text::strip_emphasis;
use hq_core::{BlockerAlert, GoalSet, RunRecord, Severity};
use regex::Regex;
use std::sync::OnceLock;

fn ceo_input_needed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)CEO\s*Input\s*Needed").expect("valid regex"))
}

fn blocked_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)BLOCKED:").expect("valid regex"))
}

fn escalation_words() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)ceo|juan|boss").expect("valid regex"))
}

/// Heartbeat lines that escalate to a critical alert.
pub fn matches_blocker_pattern(line: &str) -> bool {
    ceo_input_needed().is_match(line) || blocked_marker().is_match(line)
}

/// Whether a goal blocker mentions someone only the CEO can unblock.
pub fn requires_ceo(text: &str) -> bool {
    escalation_words().is_match(text)
}

pub fn heartbeat_alerts(run: &RunRecord, owner: &str) -> Vec<BlockerAlert> {
    run.summary
        .lines()
        .filter(|line| matches_blocker_pattern(line))
        .map(|line| BlockerAlert {
            severity: Severity::Critical,
            summary: strip_emphasis(line).trim().to_string(),
            affected_agents: vec![owner.to_string()],
            requires_ceo: true,
            first_seen_ms: run.ts,
            reported_by: owner.to_string(),
        })
        .collect()
}

/// `first_seen_ms` is the computation time: goal files carry no history.
pub fn goal_alerts(agent_id: &str, goals: &GoalSet, now_ms: i64) -> Vec<BlockerAlert> {
    goals
        .blockers
        .iter()
        .map(|blocker| BlockerAlert {
            severity: Severity::Warning,
            summary: blocker.clone(),
            affected_agents: vec![agent_id.to_string()],
            requires_ceo: requires_ceo(blocker),
            first_seen_ms: now_ms,
            reported_by: agent_id.to_string(),
        })
        .collect()
}

/// Heartbeat alerts first, then goal blockers per agent in the given order.
pub fn extract_blockers<'a>(
    heartbeat: Option<(&RunRecord, &str)>,
    agent_goals: impl IntoIterator<Item = (&'a str, &'a GoalSet)>,
    now_ms: i64,
) -> Vec<BlockerAlert> {
    let mut alerts = heartbeat
        .map(|(run, owner)| heartbeat_alerts(run, owner))
        .unwrap_or_default();
    for (agent_id, goals) in agent_goals {
        alerts.extend(goal_alerts(agent_id, goals, now_ms));
    }
    alerts
}
