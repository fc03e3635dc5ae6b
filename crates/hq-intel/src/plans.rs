//! Plan files and the plan-derived parts of a snapshot.

use hq_core::plan::{compute_phase_progress, compute_plan_progress, Plan, PlanProgress, PlanStatus};
use hq_core::{PhaseProgress, PlanContext};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only access to the plans the fleet is working through.
///
/// A snapshot calls [`PlanContextProvider::plans`] once and derives the active
/// plan and every agent's context from that one list.
pub trait PlanContextProvider: Send + Sync {
    /// Every known plan, most recently updated first.
    fn plans(&self) -> Vec<Plan>;

    fn active_plan(&self) -> Option<Plan> {
        active_plan_in(&self.plans()).cloned()
    }

    fn plan_context_for_agent(&self, agent_id: &str) -> Option<PlanContext> {
        plan_context_from(&self.plans(), agent_id)
    }

    fn phase_progress(&self, plan: &Plan, phase_id: &str) -> PlanProgress {
        compute_phase_progress(plan, phase_id)
    }
}

/// One JSON document per plan under `plans_dir`.
#[derive(Debug, Clone)]
pub struct FilePlanStore {
    plans_dir: PathBuf,
}

impl FilePlanStore {
    pub fn new(plans_dir: impl Into<PathBuf>) -> Self {
        Self {
            plans_dir: plans_dir.into(),
        }
    }

    pub fn plans_dir(&self) -> &Path {
        &self.plans_dir
    }

    /// All readable plans, most recently updated first.
    pub fn load_plans(&self) -> Vec<Plan> {
        let entries = match fs::read_dir(&self.plans_dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(plans_dir = %self.plans_dir.display(), error = %err, "plan directory unavailable");
                return Vec::new();
            }
        };
        let mut paths = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect::<Vec<_>>();
        paths.sort();

        let mut plans = paths
            .iter()
            .filter_map(|path| {
                let content = fs::read_to_string(path)
                    .map_err(|err| debug!(path = %path.display(), error = %err, "plan unreadable"))
                    .ok()?;
                serde_json::from_str::<Plan>(&content)
                    .map_err(|err| debug!(path = %path.display(), error = %err, "skipping unparsable plan"))
                    .ok()
            })
            .collect::<Vec<_>>();
        plans.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
        plans
    }
}

impl PlanContextProvider for FilePlanStore {
    fn plans(&self) -> Vec<Plan> {
        self.load_plans()
    }
}

pub fn active_plan_in(plans: &[Plan]) -> Option<&Plan> {
    plans.iter().find(|plan| plan.status == PlanStatus::Active)
}

pub fn plan_context_from(plans: &[Plan], agent_id: &str) -> Option<PlanContext> {
    plans
        .iter()
        .filter(|plan| plan.status == PlanStatus::Active)
        .find_map(|plan| plan_context_in(plan, agent_id))
}

/// The agent's first open task in `plan`, with where it sits in the plan.
pub fn plan_context_in(plan: &Plan, agent_id: &str) -> Option<PlanContext> {
    let (sub_plan, task) = plan.sub_plans.iter().find_map(|sub| {
        sub.tasks
            .iter()
            .find(|task| task.assigned_to == agent_id && task.status.is_open())
            .map(|task| (sub, task))
    })?;
    let phase = plan.phase(&sub_plan.parent_phase_id);
    Some(PlanContext {
        plan_id: plan.id.clone(),
        plan_title: plan.title.clone(),
        phase_name: phase
            .map(|phase| phase.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        phase_emoji: phase.map(|phase| phase.emoji.clone()).unwrap_or_default(),
        sub_plan_title: sub_plan.title.clone(),
        task_name: task.name.clone(),
        progress: compute_plan_progress(plan).progress,
    })
}

/// Plan-level fields of a snapshot. Without an active plan everything is zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub progress: u32,
    pub current_phase: String,
    pub phases: Vec<PhaseProgress>,
}

pub fn summarize_plan(provider: &dyn PlanContextProvider, plan: Option<&Plan>) -> PlanSummary {
    let Some(plan) = plan else {
        return PlanSummary::default();
    };
    let phases = plan
        .phases
        .iter()
        .map(|phase| {
            let progress = provider.phase_progress(plan, &phase.id);
            PhaseProgress {
                id: phase.id.clone(),
                name: phase.name.clone(),
                emoji: phase.emoji.clone(),
                status: phase.status,
                progress: progress.progress,
                task_count: progress.total,
                completed_count: progress.completed,
                blocked_count: progress.blocked,
                agents: plan.phase_assignees(&phase.id),
            }
        })
        .collect();
    PlanSummary {
        progress: compute_plan_progress(plan).progress,
        current_phase: plan.current_phase_label(),
        phases,
    }
}
