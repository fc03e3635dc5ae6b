//! Coarse per-agent health derived from the job registry and live sessions.
//!
//! This is a separate view from the activity status inside a snapshot: it is the
//! only place `error` is assigned, driven by consecutive job failures.

use crate::gateway::LiveSessions;
use hq_core::Roster;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

pub const ACTIVE_SESSION_WINDOW_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    #[serde(default)]
    pub consecutive_errors: u32,
}

/// One entry of the scheduler's `jobs.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    pub id: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub state: JobState,
}

#[derive(Debug, Default, Deserialize)]
struct JobRegistry {
    #[serde(default)]
    jobs: Vec<JobDefinition>,
}

/// Reads the job registry. A missing or malformed file yields no jobs.
pub fn load_job_registry(path: &Path) -> Vec<JobDefinition> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "job registry unreadable");
            return Vec::new();
        }
    };
    match serde_json::from_str::<JobRegistry>(&content) {
        Ok(registry) => registry.jobs,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "job registry malformed");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentHealth {
    Active,
    Idle,
    Error,
    Offline,
}

impl AgentHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentHealth::Active => "active",
            AgentHealth::Idle => "idle",
            AgentHealth::Error => "error",
            AgentHealth::Offline => "offline",
        }
    }
}

impl fmt::Display for AgentHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusSummary {
    pub id: String,
    pub name: String,
    pub status: AgentHealth,
    pub last_activity: Option<i64>,
    pub session_count: u32,
    pub cron_errors: u32,
}

pub fn summarize_agent_statuses(
    roster: &Roster,
    jobs: &[JobDefinition],
    sessions: &LiveSessions,
    now_ms: i64,
) -> Vec<AgentStatusSummary> {
    roster
        .iter()
        .map(|agent| {
            let owned = jobs.iter().filter(|job| {
                if job.agent_id.is_empty() {
                    agent.owns_job(&job.id)
                } else {
                    job.agent_id == agent.id
                }
            });
            let cron_errors: u32 = owned.map(|job| job.state.consecutive_errors).sum();
            let last_activity = sessions.updated_at(&agent.id);
            let status = if cron_errors > 0 {
                AgentHealth::Error
            } else if last_activity.is_some_and(|ts| now_ms - ts < ACTIVE_SESSION_WINDOW_MS) {
                AgentHealth::Active
            } else if sessions.has_session(&agent.id) {
                AgentHealth::Idle
            } else {
                AgentHealth::Offline
            };
            AgentStatusSummary {
                id: agent.id.clone(),
                name: if agent.name.is_empty() {
                    agent.id.clone()
                } else {
                    agent.name.clone()
                },
                status,
                last_activity,
                session_count: sessions.session_count(&agent.id),
                cron_errors,
            }
        })
        .collect()
}
