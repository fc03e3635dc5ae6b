//! Mission Control aggregation engine.
//!
//! Fuses per-job run logs, per-agent goal files, the live session list from the
//! execution gateway and the plan store into one time-windowed
//! [`MissionControlData`](hq_core::MissionControlData) snapshot, served through a
//! short-lived cache.

pub mod activity;
pub mod agent_status;
pub mod aggregator;
pub mod blockers;
pub mod cache;
pub mod config;
pub mod gateway;
pub mod goals;
pub mod jobs;
pub mod plans;
pub mod run_log;
pub mod service;
pub mod stats;
pub mod text;
pub mod ticker;

pub use aggregator::Aggregator;
pub use cache::SnapshotCache;
pub use config::IntelConfig;
pub use gateway::{LiveSessions, SessionGateway};
pub use plans::{FilePlanStore, PlanContextProvider};
pub use service::IntelService;

use hq_core::AgentIdError;
use thiserror::Error;

const INTERNAL_ERROR_MESSAGE: &str = "internal error while computing mission control snapshot";

#[derive(Debug, Error)]
pub enum IntelError {
    #[error(transparent)]
    InvalidAgentId(#[from] AgentIdError),
    #[error("invalid job id '{0}'")]
    InvalidJobId(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntelError {
    /// Rejections caused by caller input rather than by the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(self, IntelError::InvalidAgentId(_) | IntelError::InvalidJobId(_))
    }

    /// Message safe to hand to an untrusted client. Internal failures are redacted.
    pub fn public_message(&self) -> String {
        match self {
            IntelError::InvalidAgentId(_) => "Invalid agent ID".to_string(),
            IntelError::InvalidJobId(_) => "Invalid job ID".to_string(),
            IntelError::Config(_) | IntelError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}
