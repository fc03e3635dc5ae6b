use serde::{Deserialize, Serialize};

/// A known agent and the scheduled jobs it owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub department: String,
    /// Declared job ids. When empty, jobs are matched by the `{id}-...` naming convention.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<String>,
}

impl AgentProfile {
    pub fn new(id: &str, name: &str, emoji: &str, department: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            department: department.to_string(),
            jobs: Vec::new(),
        }
    }

    pub fn owns_job(&self, job_id: &str) -> bool {
        if !self.jobs.is_empty() {
            return self.jobs.iter().any(|job| job == job_id);
        }
        job_id == self.id
            || job_id
                .strip_prefix(self.id.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Roster {
    pub agents: Vec<AgentProfile>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Roster {
    pub fn new(agents: Vec<AgentProfile>) -> Self {
        Self { agents }
    }

    /// The fleet the dashboard ships with.
    pub fn builtin() -> Self {
        Self::new(vec![
            AgentProfile::new("henry", "Henry", "🏗️", "hq"),
            AgentProfile::new("warren", "Warren", "📊", "revenue"),
            AgentProfile::new("hormozi", "Hormozi", "💰", "marketing"),
            AgentProfile::new("elon", "Elon", "🚀", "engineering"),
            AgentProfile::new("sales", "Sales", "💼", "engineering"),
            AgentProfile::new("marketing", "Marketing", "📧", "engineering"),
            AgentProfile::new("tasks", "Tasks", "📋", "engineering"),
            AgentProfile::new("reviewer", "Reviewer", "🔍", "engineering"),
            AgentProfile::new("scout", "Scout", "🔭", "revenue"),
            AgentProfile::new("herald", "Herald", "📢", "revenue"),
            AgentProfile::new("quill", "Quill", "✍️", "marketing"),
        ])
    }

    pub fn get(&self, agent_id: &str) -> Option<&AgentProfile> {
        self.agents.iter().find(|agent| agent.id == agent_id)
    }

    /// First agent in roster order that owns the job.
    pub fn owner_of(&self, job_id: &str) -> Option<&AgentProfile> {
        self.agents.iter().find(|agent| agent.owns_job(job_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentProfile> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
