//! Entry point used by presentation layers.

use crate::agent_status::{load_job_registry, summarize_agent_statuses, AgentStatusSummary};
use crate::aggregator::Aggregator;
use crate::cache::SnapshotCache;
use crate::config::IntelConfig;
use crate::gateway::{collect_live_sessions, DisconnectedGateway, SessionGateway, SessionsFileGateway};
use crate::jobs::JobIndex;
use crate::plans::{FilePlanStore, PlanContextProvider};
use crate::run_log::RunLogReader;
use crate::stats::{fleet_run_stats, validate_job_id, FleetRunStats, RunHistoryPage};
use crate::IntelError;
use hq_core::{validate_agent_id, AgentIntelligence, BlockerAlert, MissionControlData};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct IntelService {
    aggregator: Aggregator,
    cache: SnapshotCache,
    gateway: Arc<dyn SessionGateway>,
    gateway_timeout: Duration,
    reader: RunLogReader,
    index: JobIndex,
    jobs_file: PathBuf,
}

impl IntelService {
    pub fn new(
        config: IntelConfig,
        gateway: Arc<dyn SessionGateway>,
        plans: Arc<dyn PlanContextProvider>,
    ) -> Self {
        let aggregator = Aggregator::new(&config, Arc::clone(&gateway), plans);
        Self {
            aggregator,
            cache: SnapshotCache::new(config.cache_ttl),
            gateway,
            gateway_timeout: config.gateway_timeout,
            reader: RunLogReader::new(&config.runs_dir),
            index: JobIndex::new(&config.runs_dir, Arc::new(config.roster)),
            jobs_file: config.jobs_file,
        }
    }

    /// Wires the file-backed sources named by `config`.
    pub fn from_config(config: IntelConfig) -> Self {
        let gateway: Arc<dyn SessionGateway> = match &config.sessions_file {
            Some(path) => Arc::new(SessionsFileGateway::new(path)),
            None => Arc::new(DisconnectedGateway),
        };
        let plans = Arc::new(FilePlanStore::new(&config.plans_dir));
        Self::new(config, gateway, plans)
    }

    /// The full snapshot, served from cache while fresh.
    pub async fn snapshot(&self) -> Result<Arc<MissionControlData>, IntelError> {
        self.cache
            .get_or_compute(|| self.aggregator.compute())
            .await
            .inspect_err(|err| warn!(error = %err, "mission control snapshot failed"))
    }

    /// `Ok(None)` when the id is well-formed but not on the roster.
    pub async fn agent_intelligence(
        &self,
        agent_id: &str,
    ) -> Result<Option<AgentIntelligence>, IntelError> {
        let agent_id = validate_agent_id(agent_id)?;
        let snapshot = self.snapshot().await?;
        Ok(snapshot.agent(agent_id).cloned())
    }

    pub async fn blockers(&self) -> Result<Vec<BlockerAlert>, IntelError> {
        Ok(self.snapshot().await?.blockers.clone())
    }

    /// Registry and session based health per agent. Not cached.
    pub async fn agent_statuses(&self) -> Vec<AgentStatusSummary> {
        let sessions = collect_live_sessions(self.gateway.as_ref(), self.gateway_timeout).await;
        let jobs = load_job_registry(&self.jobs_file);
        let now_ms = chrono::Utc::now().timestamp_millis();
        summarize_agent_statuses(self.index.roster(), &jobs, &sessions, now_ms)
    }

    pub fn run_history(
        &self,
        job_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<RunHistoryPage, IntelError> {
        let job_id = validate_job_id(job_id)?;
        Ok(self.reader.history(job_id, limit, offset))
    }

    pub fn fleet_run_stats(&self) -> FleetRunStats {
        fleet_run_stats(&self.index, &self.reader)
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}
