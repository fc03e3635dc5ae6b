pub mod intel;
pub mod plan;
pub mod roster;
pub mod run_log;

pub use intel::{
    ActivityStatus, AgentIntelligence, BlockerAlert, GoalSet, MissionControlData, OverallHealth,
    PhaseProgress, PlanContext, RunRecord, RunStatus, Severity, SparkPoint, TickerEvent,
    TickerKind,
};
pub use roster::{AgentProfile, Roster};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentIdError {
    #[error("agent id is empty")]
    Empty,
    #[error("invalid agent id '{0}': expected lowercase letters, digits and '-'")]
    InvalidCharacters(String),
}

/// Checks an agent id received from an untrusted caller against `^[a-z0-9-]+$`.
pub fn validate_agent_id(input: &str) -> Result<&str, AgentIdError> {
    if input.is_empty() {
        return Err(AgentIdError::Empty);
    }
    let valid = input
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
    if !valid {
        return Err(AgentIdError::InvalidCharacters(input.to_string()));
    }
    Ok(input)
}
