//! Agent record operations.

use super::ControlPlane;
use crate::records::{AgentRecord, PlanStep};
use deskpilot_config::Personality;
use deskpilot_process::ShellOutput;
use serde::Deserialize;
use uuid::Uuid;

/// Partial override for an existing agent.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub status: Option<String>,
    pub personality: Option<Personality>,
    pub branch: Option<String>,
    pub worktree_path: Option<String>,
    pub plan: Option<Vec<PlanStep>>,
    pub notes: Option<Vec<String>>,
}

impl ControlPlane {
    pub async fn agents(&self) -> Vec<AgentRecord> {
        self.state.lock().await.agents.clone()
    }

    /// Insert a new agent at the front of the list.
    pub async fn agent_create(&self, agent: AgentRecord) -> Vec<AgentRecord> {
        let mut state = self.state.lock().await;
        state.agents.insert(0, agent);
        self.persist(&state);
        state.agents.clone()
    }

    /// Merge a patch into one agent; unknown ids are a no-op.
    pub async fn agent_update(&self, agent_id: Uuid, patch: AgentPatch) -> Vec<AgentRecord> {
        let mut state = self.state.lock().await;
        if let Some(agent) = state.agent_mut(agent_id) {
            if let Some(name) = patch.name {
                agent.name = name;
            }
            if let Some(goal) = patch.goal {
                agent.goal = goal;
            }
            if let Some(status) = patch.status {
                agent.status = status;
            }
            if let Some(personality) = patch.personality {
                agent.personality = personality;
            }
            if let Some(branch) = patch.branch {
                agent.branch = branch;
            }
            if let Some(worktree_path) = patch.worktree_path {
                agent.worktree_path = worktree_path;
            }
            if let Some(plan) = patch.plan {
                agent.plan = plan;
            }
            if let Some(notes) = patch.notes {
                agent.notes = notes;
            }
            agent.touch();
            self.persist(&state);
        }
        state.agents.clone()
    }

    /// Append a timestamped log line to one agent.
    pub async fn agent_add_log(&self, agent_id: Uuid, line: &str) -> Vec<AgentRecord> {
        let mut state = self.state.lock().await;
        if let Some(agent) = state.agent_mut(agent_id) {
            agent.push_log(line);
            self.persist(&state);
        }
        state.agents.clone()
    }

    /// Append a pending step and/or flip the status of an existing one.
    pub async fn agent_advance_plan(
        &self,
        agent_id: Uuid,
        add_step: Option<&str>,
        index: Option<usize>,
        status: Option<&str>,
    ) -> Vec<AgentRecord> {
        let mut state = self.state.lock().await;
        if let Some(agent) = state.agent_mut(agent_id) {
            if let Some(step) = add_step {
                agent.plan.push(PlanStep::pending(step));
            }
            if let (Some(index), Some(status)) = (index, status) {
                if let Some(step) = agent.plan.get_mut(index) {
                    step.status = status.to_string();
                }
            }
            agent.touch();
            self.persist(&state);
        }
        state.agents.clone()
    }

    pub async fn agent_delete(&self, agent_id: Uuid) -> Vec<AgentRecord> {
        let mut state = self.state.lock().await;
        state.agents.retain(|agent| agent.id != agent_id);
        self.persist(&state);
        state.agents.clone()
    }

    /// Run a shell command on the agent's behalf, recording the output
    /// in its log.
    pub async fn agent_terminal_run(
        &self,
        agent_id: Uuid,
        command: &str,
        cwd: Option<&str>,
    ) -> ShellOutput {
        let cwd = cwd
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| self.sandbox.root().to_path_buf());
        let result = match deskpilot_process::run_shell_command(command, &cwd).await {
            Ok(output) => output,
            Err(err) => ShellOutput {
                ok: false,
                code: None,
                stdout: String::new(),
                stderr: err.to_string(),
            },
        };
        let mut state = self.state.lock().await;
        if let Some(agent) = state.agent_mut(agent_id) {
            agent.push_log(format!(
                "command: {command}\n{}{}",
                result.stdout, result.stderr
            ));
            self.persist(&state);
        }
        result
    }
}
