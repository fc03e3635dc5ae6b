//! Composes one [`MissionControlData`] snapshot.
//!
//! The gateway query and the local file reads run concurrently. Local reads are
//! synchronous and go through `spawn_blocking`; the gateway side is bounded by
//! a timeout. A single `now` is captured up front and used for every window.

use crate::activity::derive_activity;
use crate::blockers::extract_blockers;
use crate::config::IntelConfig;
use crate::gateway::{collect_live_sessions, LiveSessions, SessionGateway};
use crate::goals::GoalFileReader;
use crate::jobs::JobIndex;
use crate::plans::{
    active_plan_in, plan_context_from, summarize_plan, PlanContextProvider, PlanSummary,
};
use crate::run_log::{RunLogReader, RunSnapshot};
use crate::text::{clip_with_ellipsis, headline};
use crate::ticker::build_ticker;
use crate::IntelError;
use chrono::{Local, LocalResult, TimeZone};
use hq_core::plan::percent;
use hq_core::{
    AgentIntelligence, AgentProfile, BlockerAlert, GoalSet, MissionControlData, OverallHealth,
    PlanContext, Roster, RunRecord, SparkPoint, TickerEvent,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

pub const SPARKLINE_POINTS: usize = 24;
pub const GOAL_PREVIEW: usize = 5;
pub const DOING_MAX_CHARS: usize = 200;
pub const DAILY_STATS_RUNS: usize = 50;
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Local sources read on the blocking pool.
#[derive(Clone)]
struct Sources {
    reader: RunLogReader,
    index: JobIndex,
    goals: GoalFileReader,
    plans: Arc<dyn PlanContextProvider>,
    heartbeat_job: String,
    roster: Arc<Roster>,
}

/// Everything about one agent that does not depend on live sessions.
struct AgentView {
    profile: AgentProfile,
    doing: Option<(String, i64)>,
    goals: GoalSet,
    plan_context: Option<PlanContext>,
    sparkline: Vec<SparkPoint>,
    runs_today: u32,
    success_rate_24h: u32,
}

struct LocalView {
    agents: Vec<AgentView>,
    blockers: Vec<BlockerAlert>,
    ticker: Vec<TickerEvent>,
    plan: PlanSummary,
}

impl Sources {
    fn collect(&self, now_ms: i64) -> LocalView {
        let job_ids = self.index.all_job_ids();
        let runs = self.reader.snapshot(&job_ids);
        let day_start = local_day_start_ms(now_ms);
        let plans = self.plans.plans();

        let agents = self
            .roster
            .iter()
            .map(|profile| {
                let owned = self.index.owned_by(&profile.id, &job_ids);
                let (runs_today, success_rate_24h) = daily_counts(&runs, &owned, day_start, now_ms);
                AgentView {
                    profile: profile.clone(),
                    doing: extract_doing(&runs, &owned),
                    goals: self.goals.parse(&profile.id),
                    plan_context: plan_context_from(&plans, &profile.id),
                    sparkline: build_sparkline(&runs, &owned),
                    runs_today,
                    success_rate_24h,
                }
            })
            .collect::<Vec<_>>();

        let heartbeat_owner = self.index.owner_of(&self.heartbeat_job).agent_id;
        let blockers = extract_blockers(
            runs.latest(&self.heartbeat_job)
                .map(|run| (run, heartbeat_owner.as_str())),
            agents
                .iter()
                .map(|agent| (agent.profile.id.as_str(), &agent.goals)),
            now_ms,
        );
        let ticker = build_ticker(&runs, &self.roster);
        let plan = summarize_plan(self.plans.as_ref(), active_plan_in(&plans));

        LocalView {
            agents,
            blockers,
            ticker,
            plan,
        }
    }
}

pub struct Aggregator {
    sources: Sources,
    gateway: Arc<dyn SessionGateway>,
    gateway_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        config: &IntelConfig,
        gateway: Arc<dyn SessionGateway>,
        plans: Arc<dyn PlanContextProvider>,
    ) -> Self {
        let roster = Arc::new(config.roster.clone());
        Self {
            sources: Sources {
                reader: RunLogReader::new(&config.runs_dir),
                index: JobIndex::new(&config.runs_dir, Arc::clone(&roster)),
                goals: GoalFileReader::new(&config.goals_dir),
                plans,
                heartbeat_job: config.heartbeat_job.clone(),
                roster,
            },
            gateway,
            gateway_timeout: config.gateway_timeout,
        }
    }

    pub async fn compute(&self) -> Result<MissionControlData, IntelError> {
        self.compute_at(chrono::Utc::now().timestamp_millis()).await
    }

    pub async fn compute_at(&self, now_ms: i64) -> Result<MissionControlData, IntelError> {
        let started = Instant::now();
        let sources = self.sources.clone();
        let (sessions, local) = tokio::join!(
            collect_live_sessions(self.gateway.as_ref(), self.gateway_timeout),
            tokio::task::spawn_blocking(move || sources.collect(now_ms))
        );
        let local = local.map_err(|err| IntelError::Internal(format!("local source read: {err}")))?;
        let data = compose(local, &sessions, now_ms);
        info!(
            agents = data.agents.len(),
            active = data.active_agents,
            blocked = data.blocked_agents,
            alerts = data.blockers.len(),
            ticker = data.ticker.len(),
            live_sessions = sessions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "mission control snapshot computed"
        );
        Ok(data)
    }
}

fn compose(local: LocalView, sessions: &LiveSessions, now_ms: i64) -> MissionControlData {
    let agents = local
        .agents
        .into_iter()
        .map(|view| {
            let id = view.profile.id;
            let doing_ts = view.doing.as_ref().map(|(_, ts)| *ts);
            let last_activity_ms = match (sessions.updated_at(&id), doing_ts) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            let activity_status = derive_activity(
                sessions.has_session(&id),
                view.goals.has_blockers(),
                last_activity_ms,
                now_ms,
            );
            let (doing, doing_timestamp) = match view.doing {
                Some((text, ts)) => (Some(text), Some(ts)),
                None => (None, None),
            };
            let mut goals = view.goals;
            goals.active.truncate(GOAL_PREVIEW);
            goals.completed.truncate(GOAL_PREVIEW);
            AgentIntelligence {
                id,
                name: view.profile.name,
                emoji: view.profile.emoji,
                department: view.profile.department,
                activity_status,
                doing,
                doing_timestamp,
                plan_context: view.plan_context,
                active_goals: goals.active,
                completed_goals: goals.completed,
                blockers: goals.blockers,
                last_activity_ms,
                runs_today: view.runs_today,
                success_rate_24h: view.success_rate_24h,
                activity_sparkline: view.sparkline,
            }
        })
        .collect::<Vec<_>>();

    let blocked = agents
        .iter()
        .filter(|agent| agent.activity_status.is_blocked())
        .count();
    let active = agents
        .iter()
        .filter(|agent| agent.activity_status.is_active())
        .count();

    MissionControlData {
        overall_health: OverallHealth::from_blocked_count(blocked),
        active_agents: active as u32,
        blocked_agents: blocked as u32,
        plan_progress: local.plan.progress,
        current_phase: local.plan.current_phase,
        agents,
        blockers: local.blockers,
        ticker: local.ticker,
        phases: local.plan.phases,
    }
}

/// Headline of the newest latest-run across the agent's jobs. Ties keep the first job seen.
fn extract_doing(runs: &RunSnapshot, job_ids: &[String]) -> Option<(String, i64)> {
    let mut newest: Option<&RunRecord> = None;
    for run in job_ids.iter().filter_map(|job_id| runs.latest(job_id)) {
        if newest.map_or(true, |current| run.ts > current.ts) {
            newest = Some(run);
        }
    }
    let run = newest?;
    let text = headline(&run.summary);
    if text.is_empty() {
        return None;
    }
    Some((clip_with_ellipsis(&text, DOING_MAX_CHARS), run.ts))
}

fn build_sparkline(runs: &RunSnapshot, job_ids: &[String]) -> Vec<SparkPoint> {
    let mut points = job_ids
        .iter()
        .flat_map(|job_id| runs.recent(job_id, SPARKLINE_POINTS))
        .map(SparkPoint::from)
        .collect::<Vec<_>>();
    points.sort_by_key(|point| point.ts);
    let skip = points.len().saturating_sub(SPARKLINE_POINTS);
    points.drain(..skip);
    points
}

/// Runs since local midnight and the success percentage over the trailing day.
fn daily_counts(runs: &RunSnapshot, job_ids: &[String], day_start_ms: i64, now_ms: i64) -> (u32, u32) {
    let mut today = 0;
    let mut total_24h = 0;
    let mut ok_24h = 0;
    for run in job_ids
        .iter()
        .flat_map(|job_id| runs.recent(job_id, DAILY_STATS_RUNS))
    {
        if run.ts >= day_start_ms {
            today += 1;
        }
        if run.ts >= now_ms - DAY_MS {
            total_24h += 1;
            if run.status.is_ok() {
                ok_24h += 1;
            }
        }
    }
    let rate = if total_24h == 0 {
        100
    } else {
        percent(ok_24h, total_24h)
    };
    (today, rate)
}

/// Local midnight of the day containing `now_ms`.
pub fn local_day_start_ms(now_ms: i64) -> i64 {
    let Some(now) = Local.timestamp_millis_opt(now_ms).single() else {
        return now_ms - now_ms.rem_euclid(DAY_MS);
    };
    let Some(midnight) = now.date_naive().and_hms_opt(0, 0, 0) else {
        return now_ms;
    };
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(start) | LocalResult::Ambiguous(start, _) => start.timestamp_millis(),
        LocalResult::None => now_ms - now_ms.rem_euclid(DAY_MS),
    }
}
