use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Draft => "draft",
            PhaseStatus::InProgress => "in-progress",
            PhaseStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PlanTaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl PlanTaskStatus {
    /// Tasks an agent is still expected to work on.
    pub fn is_open(&self) -> bool {
        matches!(self, PlanTaskStatus::Pending | PlanTaskStatus::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanPhase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub status: PhaseStatus,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub assigned_to_name: String,
    #[serde(default)]
    pub status: PlanTaskStatus,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubPlan {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub parent_phase_id: String,
    #[serde(default)]
    pub tasks: Vec<PlanTask>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: PlanStatus,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub phases: Vec<PlanPhase>,
    #[serde(default)]
    pub sub_plans: Vec<SubPlan>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl Plan {
    pub fn phase(&self, phase_id: &str) -> Option<&PlanPhase> {
        self.phases.iter().find(|phase| phase.id == phase_id)
    }

    pub fn sub_plans_in_phase<'a>(&'a self, phase_id: &'a str) -> impl Iterator<Item = &'a SubPlan> {
        self.sub_plans
            .iter()
            .filter(move |sub| sub.parent_phase_id == phase_id)
    }

    /// Label of the first phase currently in progress, e.g. `"🚀 Launch"`.
    pub fn current_phase_label(&self) -> String {
        self.phases
            .iter()
            .find(|phase| phase.status == PhaseStatus::InProgress)
            .map(|phase| format!("{} {}", phase.emoji, phase.name))
            .unwrap_or_default()
    }

    /// Distinct task assignees across the phase, in first-seen order.
    pub fn phase_assignees(&self, phase_id: &str) -> Vec<String> {
        let mut agents: Vec<String> = Vec::new();
        for task in self.sub_plans_in_phase(phase_id).flat_map(|sub| &sub.tasks) {
            if task.assigned_to.is_empty() || agents.contains(&task.assigned_to) {
                continue;
            }
            agents.push(task.assigned_to.clone());
        }
        agents
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanProgress {
    pub total: u32,
    pub completed: u32,
    pub blocked: u32,
    pub in_progress: u32,
    pub pending: u32,
    pub progress: u32,
}

impl PlanProgress {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a PlanTask>) -> Self {
        let mut out = PlanProgress::default();
        for task in tasks {
            out.total += 1;
            match task.status {
                PlanTaskStatus::Completed => out.completed += 1,
                PlanTaskStatus::Blocked => out.blocked += 1,
                PlanTaskStatus::InProgress => out.in_progress += 1,
                PlanTaskStatus::Pending => out.pending += 1,
            }
        }
        out.progress = percent(out.completed, out.total);
        out
    }
}

pub fn compute_plan_progress(plan: &Plan) -> PlanProgress {
    PlanProgress::from_tasks(plan.sub_plans.iter().flat_map(|sub| &sub.tasks))
}

pub fn compute_phase_progress(plan: &Plan, phase_id: &str) -> PlanProgress {
    PlanProgress::from_tasks(plan.sub_plans_in_phase(phase_id).flat_map(|sub| &sub.tasks))
}

pub fn compute_sub_plan_progress(sub_plan: &SubPlan) -> PlanProgress {
    PlanProgress::from_tasks(&sub_plan.tasks)
}

/// Rounded percentage, zero when there is nothing to count.
pub fn percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((f64::from(part) / f64::from(total)) * 100.0).round() as u32
}
