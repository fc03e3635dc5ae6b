//! Derived mission-control model.
//!
//! Everything here is recomputed from the run logs, goal files, live sessions and
//! plan store on every snapshot; nothing is mutated in place. Field names follow
//! the camelCase JSON contract the dashboard consumes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Ok => "ok",
            RunStatus::Error => "error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RunStatus::Ok)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    /// Run logs only ever distinguish success from everything else.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "ok" => Ok(RunStatus::Ok),
            "" => Err("empty run status".to_string()),
            _ => Ok(RunStatus::Error),
        }
    }
}

/// One scheduled-job execution outcome, as appended to the job's run log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub ts: i64,
    pub status: RunStatus,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalSet {
    pub active: Vec<String>,
    pub completed: Vec<String>,
    pub blockers: Vec<String>,
}

impl GoalSet {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.completed.is_empty() && self.blockers.is_empty()
    }

    pub fn has_blockers(&self) -> bool {
        !self.blockers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Executing,
    Blocked,
    Waiting,
    Idle,
    Offline,
    Error,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Executing => "executing",
            ActivityStatus::Blocked => "blocked",
            ActivityStatus::Waiting => "waiting",
            ActivityStatus::Idle => "idle",
            ActivityStatus::Offline => "offline",
            ActivityStatus::Error => "error",
        }
    }

    /// Counted towards `activeAgents`.
    pub fn is_active(&self) -> bool {
        matches!(self, ActivityStatus::Executing | ActivityStatus::Waiting)
    }

    /// Counted towards `blockedAgents`.
    pub fn is_blocked(&self) -> bool {
        matches!(self, ActivityStatus::Blocked | ActivityStatus::Error)
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanContext {
    pub plan_id: String,
    pub plan_title: String,
    pub phase_name: String,
    pub phase_emoji: String,
    pub sub_plan_title: String,
    pub task_name: String,
    pub progress: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SparkPoint {
    pub ts: i64,
    pub status: RunStatus,
    pub duration_ms: u64,
}

impl From<&RunRecord> for SparkPoint {
    fn from(run: &RunRecord) -> Self {
        Self {
            ts: run.ts,
            status: run.status,
            duration_ms: run.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentIntelligence {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub department: String,
    pub activity_status: ActivityStatus,
    pub doing: Option<String>,
    pub doing_timestamp: Option<i64>,
    pub plan_context: Option<PlanContext>,
    pub active_goals: Vec<String>,
    pub completed_goals: Vec<String>,
    pub blockers: Vec<String>,
    pub last_activity_ms: Option<i64>,
    pub runs_today: u32,
    pub success_rate_24h: u32,
    pub activity_sparkline: Vec<SparkPoint>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockerAlert {
    pub severity: Severity,
    pub summary: String,
    pub affected_agents: Vec<String>,
    pub requires_ceo: bool,
    pub first_seen_ms: i64,
    pub reported_by: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TickerKind {
    CronOk,
    CronError,
}

impl From<RunStatus> for TickerKind {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Ok => TickerKind::CronOk,
            RunStatus::Error => TickerKind::CronError,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TickerEvent {
    pub ts: i64,
    pub agent_id: String,
    pub agent_name: String,
    pub emoji: String,
    #[serde(rename = "type")]
    pub kind: TickerKind,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub status: crate::plan::PhaseStatus,
    pub progress: u32,
    pub task_count: u32,
    pub completed_count: u32,
    pub blocked_count: u32,
    pub agents: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Green,
    Yellow,
    Red,
}

impl OverallHealth {
    pub fn from_blocked_count(blocked: usize) -> Self {
        if blocked > 2 {
            OverallHealth::Red
        } else if blocked > 0 {
            OverallHealth::Yellow
        } else {
            OverallHealth::Green
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissionControlData {
    pub overall_health: OverallHealth,
    pub active_agents: u32,
    pub blocked_agents: u32,
    pub plan_progress: u32,
    pub current_phase: String,
    pub agents: Vec<AgentIntelligence>,
    pub blockers: Vec<BlockerAlert>,
    pub ticker: Vec<TickerEvent>,
    pub phases: Vec<PhaseProgress>,
}

impl MissionControlData {
    pub fn agent(&self, agent_id: &str) -> Option<&AgentIntelligence> {
        self.agents.iter().find(|agent| agent.id == agent_id)
    }
}
