//! Maps job ids in the runs directory to the agents that own them.

use crate::run_log::RUN_LOG_EXTENSION;
use hq_core::{AgentProfile, Roster};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Lists known jobs from the run-log directory and associates them with agents.
#[derive(Debug, Clone)]
pub struct JobIndex {
    runs_dir: PathBuf,
    roster: Arc<Roster>,
}

/// Display identity of the agent a job belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOwner {
    pub agent_id: String,
    pub agent_name: String,
    pub emoji: String,
}

impl JobOwner {
    /// Resolves through the roster; unknown jobs fall back to their first `-` segment.
    pub fn resolve(roster: &Roster, job_id: &str) -> Self {
        if let Some(agent) = roster.owner_of(job_id) {
            return Self {
                agent_id: agent.id.clone(),
                agent_name: agent.name.clone(),
                emoji: agent.emoji.clone(),
            };
        }
        let prefix = job_id.split('-').next().unwrap_or(job_id).to_string();
        Self {
            agent_id: prefix.clone(),
            agent_name: prefix,
            emoji: String::new(),
        }
    }
}

impl JobIndex {
    pub fn new(runs_dir: impl Into<PathBuf>, roster: Arc<Roster>) -> Self {
        Self {
            runs_dir: runs_dir.into(),
            roster,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Job ids with a run log, sorted. A missing directory yields no jobs.
    pub fn all_job_ids(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.runs_dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(runs_dir = %self.runs_dir.display(), error = %err, "run log directory unavailable");
                return Vec::new();
            }
        };
        let mut ids = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some(RUN_LOG_EXTENSION) {
                    return None;
                }
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn job_ids_for_agent(&self, agent_id: &str) -> Vec<String> {
        self.owned_by(agent_id, &self.all_job_ids())
    }

    /// Filters an already listed set of job ids down to the ones the agent owns.
    pub fn owned_by(&self, agent_id: &str, job_ids: &[String]) -> Vec<String> {
        let unlisted;
        let agent = match self.roster.get(agent_id) {
            Some(agent) => agent,
            None => {
                unlisted = AgentProfile::new(agent_id, agent_id, "", "");
                &unlisted
            }
        };
        job_ids
            .iter()
            .filter(|job_id| agent.owns_job(job_id))
            .cloned()
            .collect()
    }

    pub fn owner_of(&self, job_id: &str) -> JobOwner {
        JobOwner::resolve(&self.roster, job_id)
    }
}
