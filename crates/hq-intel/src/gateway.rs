//! Client side of the execution gateway's session list.
//!
//! The gateway is optional and unreliable. Every failure mode (not connected,
//! request error, malformed payload, timeout) collapses to "no live sessions".

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default, deserialize_with = "millis_from_number")]
    pub updated_at: i64,
    #[serde(default)]
    pub key: Option<String>,
}

impl LiveSession {
    /// Session keys look like `agent:{id}:{channel}`; used when `agentId` is absent.
    fn resolved_agent_id(&self) -> Option<String> {
        if !self.agent_id.trim().is_empty() {
            return Some(self.agent_id.trim().to_string());
        }
        let mut parts = self.key.as_deref()?.split(':');
        match (parts.next(), parts.next()) {
            (Some("agent"), Some(id)) if !id.is_empty() => Some(id.to_string()),
            _ => None,
        }
    }
}

/// Some gateways report fractional milliseconds.
fn millis_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let millis = Option::<f64>::deserialize(deserializer)?;
    Ok(millis
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map_or(0, |ms| ms as i64))
}

/// The list response is either a bare array or `{ "sessions": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SessionListing {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        sessions: Vec<Value>,
    },
}

impl SessionListing {
    /// Decodes entries one by one, dropping the ones without an agent.
    pub fn into_sessions(self) -> Vec<LiveSession> {
        let raw = match self {
            SessionListing::Bare(items) => items,
            SessionListing::Wrapped { sessions } => sessions,
        };
        raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<LiveSession>(value) {
                Ok(session) => Some(session),
                Err(err) => {
                    debug!(error = %err, "skipping undecodable session entry");
                    None
                }
            })
            .filter_map(|mut session| {
                let agent_id = session.resolved_agent_id()?;
                session.agent_id = agent_id;
                Some(session)
            })
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway not connected")]
    NotConnected,
    #[error("gateway request failed: {0}")]
    Request(String),
    #[error("malformed session listing: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait SessionGateway: Send + Sync {
    fn is_connected(&self) -> bool;
    async fn list_sessions(&self) -> Result<SessionListing, GatewayError>;
}

/// Used when no gateway is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedGateway;

#[async_trait]
impl SessionGateway for DisconnectedGateway {
    fn is_connected(&self) -> bool {
        false
    }

    async fn list_sessions(&self) -> Result<SessionListing, GatewayError> {
        Err(GatewayError::NotConnected)
    }
}

/// Fixed in-memory session list.
#[derive(Debug, Clone, Default)]
pub struct StaticGateway {
    sessions: Vec<LiveSession>,
}

impl StaticGateway {
    pub fn new(sessions: Vec<LiveSession>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl SessionGateway for StaticGateway {
    fn is_connected(&self) -> bool {
        true
    }

    async fn list_sessions(&self) -> Result<SessionListing, GatewayError> {
        let values = self
            .sessions
            .iter()
            .map(|session| {
                serde_json::json!({
                    "agentId": session.agent_id,
                    "updatedAt": session.updated_at,
                    "key": session.key,
                })
            })
            .collect();
        Ok(SessionListing::Bare(values))
    }
}

/// Reads a session listing dumped to disk by the gateway.
#[derive(Debug, Clone)]
pub struct SessionsFileGateway {
    path: PathBuf,
}

impl SessionsFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionGateway for SessionsFileGateway {
    fn is_connected(&self) -> bool {
        self.path.is_file()
    }

    async fn list_sessions(&self) -> Result<SessionListing, GatewayError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| GatewayError::Request(format!("{}: {err}", self.path.display())))?;
        serde_json::from_str(&content).map_err(|err| GatewayError::Malformed(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AgentSessions {
    count: u32,
    updated_at: i64,
}

/// Live sessions grouped per agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSessions {
    by_agent: HashMap<String, AgentSessions>,
}

impl LiveSessions {
    pub fn from_sessions(sessions: impl IntoIterator<Item = LiveSession>) -> Self {
        let mut by_agent: HashMap<String, AgentSessions> = HashMap::new();
        for session in sessions {
            let entry = by_agent.entry(session.agent_id).or_default();
            entry.count += 1;
            entry.updated_at = entry.updated_at.max(session.updated_at);
        }
        Self { by_agent }
    }

    pub fn has_session(&self, agent_id: &str) -> bool {
        self.by_agent.contains_key(agent_id)
    }

    /// Latest update across the agent's sessions; `None` when it has none or none carry a time.
    pub fn updated_at(&self, agent_id: &str) -> Option<i64> {
        self.by_agent
            .get(agent_id)
            .map(|sessions| sessions.updated_at)
            .filter(|ts| *ts > 0)
    }

    pub fn session_count(&self, agent_id: &str) -> u32 {
        self.by_agent
            .get(agent_id)
            .map(|sessions| sessions.count)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.by_agent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_agent.is_empty()
    }
}

/// Queries the gateway, bounded by `timeout`. Never fails.
pub async fn collect_live_sessions(gateway: &dyn SessionGateway, timeout: Duration) -> LiveSessions {
    if !gateway.is_connected() {
        debug!("session gateway not connected");
        return LiveSessions::default();
    }
    match tokio::time::timeout(timeout, gateway.list_sessions()).await {
        Ok(Ok(listing)) => LiveSessions::from_sessions(listing.into_sessions()),
        Ok(Err(err)) => {
            warn!(error = %err, "session gateway query failed");
            LiveSessions::default()
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "session gateway query timed out");
            LiveSessions::default()
        }
    }
}
