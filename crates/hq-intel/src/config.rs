//! Paths, roster and timeouts, resolved from the environment.

use crate::IntelError;
use hq_core::Roster;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_millis(3_000);
pub const DEFAULT_HEARTBEAT_JOB: &str = "henry-heartbeat";

#[derive(Clone, Debug)]
pub struct IntelConfig {
    pub runs_dir: PathBuf,
    pub jobs_file: PathBuf,
    pub goals_dir: PathBuf,
    pub plans_dir: PathBuf,
    pub sessions_file: Option<PathBuf>,
    pub heartbeat_job: String,
    pub cache_ttl: Duration,
    pub gateway_timeout: Duration,
    pub roster: Roster,
}

impl IntelConfig {
    /// Default layout rooted at one state directory, with the built-in roster.
    pub fn from_state_dir(state_dir: &Path) -> Self {
        Self {
            runs_dir: state_dir.join("cron").join("runs"),
            jobs_file: state_dir.join("cron").join("jobs.json"),
            goals_dir: state_dir.join("agents-context"),
            plans_dir: state_dir.join("plans"),
            sessions_file: None,
            heartbeat_job: DEFAULT_HEARTBEAT_JOB.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            roster: Roster::builtin(),
        }
    }

    /// Resolves the configuration from `HQ_*` environment variables.
    pub fn load() -> Result<Self, IntelError> {
        Self::load_with_state_dir(None)
    }

    /// Like [`IntelConfig::load`], with an explicit state directory taking precedence
    /// over `HQ_STATE_DIR`.
    pub fn load_with_state_dir(state_dir: Option<PathBuf>) -> Result<Self, IntelError> {
        let state_dir = state_dir.unwrap_or_else(resolve_state_dir);
        let mut config = Self::from_state_dir(&state_dir);
        if let Some(path) = env_path("HQ_RUNS_DIR") {
            config.runs_dir = path;
        }
        if let Some(path) = env_path("HQ_JOBS_FILE") {
            config.jobs_file = path;
        }
        if let Some(path) = env_path("HQ_GOALS_DIR") {
            config.goals_dir = path;
        }
        if let Some(path) = env_path("HQ_PLANS_DIR") {
            config.plans_dir = path;
        }
        config.sessions_file = env_path("HQ_SESSIONS_FILE");
        if let Some(job) = env_value("HQ_HEARTBEAT_JOB") {
            config.heartbeat_job = job;
        }
        config.gateway_timeout = resolve_gateway_timeout()?;
        if let Some(path) = env_path("HQ_ROSTER") {
            config.roster = load_roster(&path)?;
        }
        Ok(config)
    }
}

/// Reads a TOML roster: a list of `[[agents]]` tables.
pub fn load_roster(path: &Path) -> Result<Roster, IntelError> {
    let contents = fs::read_to_string(path)
        .map_err(|err| IntelError::Config(format!("read roster {}: {err}", path.display())))?;
    parse_roster(&contents)
        .map_err(|err| IntelError::Config(format!("parse roster {}: {err}", path.display())))
}

pub fn parse_roster(contents: &str) -> Result<Roster, String> {
    let roster: Roster = toml::from_str(contents).map_err(|err| err.to_string())?;
    if roster.is_empty() {
        return Err("roster defines no agents".to_string());
    }
    for agent in roster.iter() {
        hq_core::validate_agent_id(&agent.id).map_err(|err| err.to_string())?;
    }
    Ok(roster)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_value(key).map(PathBuf::from)
}

fn resolve_state_dir() -> PathBuf {
    if let Some(path) = env_path("HQ_STATE_DIR") {
        return path;
    }
    match dirs::home_dir() {
        Some(home) => home.join(".openclaw"),
        None => PathBuf::from(".openclaw"),
    }
}

fn resolve_gateway_timeout() -> Result<Duration, IntelError> {
    let Some(raw) = env_value("HQ_GATEWAY_TIMEOUT_MS") else {
        return Ok(DEFAULT_GATEWAY_TIMEOUT);
    };
    raw.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|err| IntelError::Config(format!("HQ_GATEWAY_TIMEOUT_MS '{raw}': {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dir_layout_matches_the_openclaw_tree() {
        let config = IntelConfig::from_state_dir(Path::new("/srv/claw"));
        assert_eq!(config.runs_dir, PathBuf::from("/srv/claw/cron/runs"));
        assert_eq!(config.jobs_file, PathBuf::from("/srv/claw/cron/jobs.json"));
        assert_eq!(config.plans_dir, PathBuf::from("/srv/claw/plans"));
        assert_eq!(config.heartbeat_job, "henry-heartbeat");
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert!(config.sessions_file.is_none());
    }

    #[test]
    fn parses_roster_with_declared_jobs() {
        let roster = parse_roster(
            r#"
            [[agents]]
            id = "henry"
            name = "Henry"
            emoji = "🏗️"
            department = "hq"

            [[agents]]
            id = "herald"
            name = "Herald"
            jobs = ["launch-announcer"]
            "#,
        )
        .expect("roster");
        assert_eq!(roster.len(), 2);
        assert_eq!(
            roster.owner_of("launch-announcer").map(|a| a.id.as_str()),
            Some("herald")
        );
        assert_eq!(roster.get("herald").map(|a| a.department.as_str()), Some(""));
    }

    #[test]
    fn rejects_empty_roster_and_bad_ids() {
        assert!(parse_roster("agents = []").is_err());
        assert!(parse_roster("[[agents]]\nid = \"Bad Id\"\nname = \"x\"\n").is_err());
        assert!(parse_roster("not = [valid").is_err());
    }

    #[test]
    fn missing_roster_file_is_a_config_error() {
        let err = load_roster(Path::new("/definitely/not/here.toml")).expect_err("missing");
        assert!(matches!(err, IntelError::Config(_)));
    }
}
