//! Agent and research-job records.
//!
//! These are plain CRUD records layered on top of the persisted
//! document. Statuses are open-ended strings rather than enums; the
//! persisted document predates any fixed vocabulary and callers are
//! free to introduce new ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Most recent log lines kept per agent.
pub const AGENT_LOG_CAP: usize = 200;

/// One step of an agent's plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanStep {
    pub step: String,
    #[serde(default = "pending_status")]
    pub status: String,
}

impl PlanStep {
    pub fn pending(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: pending_status(),
        }
    }
}

fn pending_status() -> String {
    "pending".to_string()
}

/// A persisted agent record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "default_agent_name")]
    pub name: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default = "idle_status")]
    pub status: String,
    #[serde(default)]
    pub personality: deskpilot_config::Personality,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub worktree_path: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub plan: Vec<PlanStep>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Default for AgentRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: default_agent_name(),
            goal: String::new(),
            status: idle_status(),
            personality: deskpilot_config::Personality::default(),
            branch: default_branch(),
            worktree_path: String::new(),
            created_at: now,
            updated_at: now,
            plan: Vec::new(),
            logs: Vec::new(),
            notes: Vec::new(),
        }
    }
}

impl AgentRecord {
    /// Append a timestamped log line, keeping only the newest entries.
    pub fn push_log(&mut self, line: impl AsRef<str>) {
        self.logs
            .push(format!("[{}] {}", Utc::now().to_rfc3339(), line.as_ref()));
        if self.logs.len() > AGENT_LOG_CAP {
            let drop = self.logs.len() - AGENT_LOG_CAP;
            self.logs.drain(..drop);
        }
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn default_agent_name() -> String {
    "New Agent".to_string()
}

fn idle_status() -> String {
    "idle".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

/// A persisted research job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchJobRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "default_job_title")]
    pub title: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default = "idle_status")]
    pub status: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub report: String,
    #[serde(default)]
    pub experiments: Vec<String>,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl Default for ResearchJobRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: default_job_title(),
            objective: String::new(),
            status: idle_status(),
            created_at: now,
            updated_at: now,
            findings: Vec::new(),
            report: String::new(),
            experiments: Vec::new(),
            logs: Vec::new(),
        }
    }
}

impl ResearchJobRecord {
    pub fn push_log(&mut self, line: impl AsRef<str>) {
        self.logs
            .push(format!("[{}] {}", Utc::now().to_rfc3339(), line.as_ref()));
        self.updated_at = Utc::now();
    }
}

fn default_job_title() -> String {
    "Research Job".to_string()
}
