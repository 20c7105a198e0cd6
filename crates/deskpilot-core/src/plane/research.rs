//! Research job operations.
//!
//! A research run snapshots the repository (file sample, git status,
//! worktrees, README excerpt), asks the active provider for a
//! structured report, and extracts bullet findings from it. A failed
//! model call degrades to a canned fallback report rather than failing
//! the run.

use super::ControlPlane;
use crate::records::{AgentRecord, PlanStep, ResearchJobRecord};
use deskpilot_protocol::{ChatMessage, Role};
use log::info;
use serde::Serialize;
use uuid::Uuid;

/// Findings kept per research cycle.
const MAX_FINDINGS: usize = 20;

/// Findings converted into plan steps when promoting to an agent.
const PROMOTED_STEPS: usize = 8;

/// Characters of README included in the repository snapshot.
const README_EXCERPT_CHARS: usize = 6000;

/// Result of running one research cycle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResearchOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<ResearchJobRecord>,
}

/// Result of promoting a research job into an agent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PromoteOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentRecord>,
    pub agents: Vec<AgentRecord>,
}

struct RepoSnapshot {
    files: String,
    git_status: String,
    worktrees: String,
    readme: String,
}

impl ControlPlane {
    pub async fn research_jobs(&self) -> Vec<ResearchJobRecord> {
        self.state.lock().await.research_jobs.clone()
    }

    pub async fn research_create(&self, job: ResearchJobRecord) -> Vec<ResearchJobRecord> {
        let mut state = self.state.lock().await;
        state.research_jobs.insert(0, job);
        self.persist(&state);
        state.research_jobs.clone()
    }

    pub async fn research_delete(&self, job_id: Uuid) -> Vec<ResearchJobRecord> {
        let mut state = self.state.lock().await;
        state.research_jobs.retain(|job| job.id != job_id);
        self.persist(&state);
        state.research_jobs.clone()
    }

    /// Run one research cycle for a job.
    pub async fn research_run(&self, job_id: Uuid) -> ResearchOutcome {
        let objective = {
            let mut state = self.state.lock().await;
            let Some(job) = state.research_job_mut(job_id) else {
                return ResearchOutcome {
                    ok: false,
                    message: Some("Research job not found".to_string()),
                    job: None,
                };
            };
            job.status = "running".to_string();
            job.push_log("Started research cycle.");
            let objective = if job.objective.is_empty() {
                job.title.clone()
            } else {
                job.objective.clone()
            };
            self.persist(&state);
            objective
        };

        let snapshot = self.repo_snapshot().await;
        let prompt = [
            "You are a software research strategist helping an IDE self-evolve.".to_string(),
            format!("Research Objective: {objective}"),
            "Analyze the repository snapshot and propose a structured evolution plan.".to_string(),
            "Return plain markdown with sections: Findings, Gaps, Experiments, Suggested Implementation Plan, Risks.".to_string(),
            String::new(),
            "Repository files sample:".to_string(),
            snapshot.files,
            String::new(),
            "Git status:".to_string(),
            snapshot.git_status,
            String::new(),
            "Worktrees:".to_string(),
            snapshot.worktrees,
            String::new(),
            "README excerpt:".to_string(),
            snapshot.readme,
        ]
        .join("\n");

        let settings = self.state.lock().await.settings.clone();
        let transcript = vec![
            ChatMessage {
                role: Role::System,
                content: format!(
                    "{}\n{}",
                    settings.system_prompt,
                    settings.personality.directive()
                ),
            },
            ChatMessage {
                role: Role::User,
                content: prompt,
            },
        ];
        let report = match self.router.complete(&settings, &transcript).await {
            Ok(completion) => completion.content,
            Err(err) => format!(
                "Model unavailable during research. Fallback report.\n\n\
                 Potential next steps:\n\
                 - Run test suites\n\
                 - Compare feature parity against the roadmap\n\
                 - Add measurable benchmarks\n\n\
                 Error: {err}"
            ),
        };

        let findings = extract_findings(&report);
        info!(
            "research cycle completed (job={job_id}, findings={})",
            findings.len()
        );

        let mut state = self.state.lock().await;
        let Some(job) = state.research_job_mut(job_id) else {
            return ResearchOutcome {
                ok: false,
                message: Some("Research job not found".to_string()),
                job: None,
            };
        };
        job.push_log(format!(
            "Completed research cycle with {} extracted findings.",
            findings.len()
        ));
        job.findings = findings;
        job.report = report;
        job.status = "completed".to_string();
        let job = job.clone();
        self.persist(&state);
        ResearchOutcome {
            ok: true,
            message: None,
            job: Some(job),
        }
    }

    /// Turn a completed job's findings into a fresh agent plan.
    pub async fn research_promote(&self, job_id: Uuid) -> PromoteOutcome {
        let mut state = self.state.lock().await;
        let Some(job) = state.research_jobs.iter().find(|job| job.id == job_id) else {
            return PromoteOutcome {
                ok: false,
                message: Some("Research job not found".to_string()),
                agent: None,
                agents: state.agents.clone(),
            };
        };

        let agent = AgentRecord {
            name: format!("Research Agent: {}", job.title),
            goal: if job.objective.is_empty() {
                job.title.clone()
            } else {
                job.objective.clone()
            },
            status: "planning".to_string(),
            plan: job
                .findings
                .iter()
                .take(PROMOTED_STEPS)
                .map(|finding| PlanStep::pending(strip_list_marker(finding)))
                .collect(),
            logs: vec![format!("Promoted from research job {}", job.id)],
            ..AgentRecord::default()
        };
        state.agents.insert(0, agent.clone());
        self.persist(&state);
        PromoteOutcome {
            ok: true,
            message: None,
            agent: Some(agent),
            agents: state.agents.clone(),
        }
    }

    async fn repo_snapshot(&self) -> RepoSnapshot {
        let files = self.shell("rg --files | head -n 200").await;
        let git_status = self.shell("git status --short --branch").await;
        let worktrees = self.shell("git worktree list").await;
        let readme = self
            .sandbox
            .read_file("README.md")
            .map(|content| content.chars().take(README_EXCERPT_CHARS).collect())
            .unwrap_or_default();
        RepoSnapshot {
            files: prefer_stdout(files.stdout, files.stderr),
            git_status: prefer_stdout(git_status.stdout, git_status.stderr),
            worktrees: prefer_stdout(worktrees.stdout, worktrees.stderr),
            readme,
        }
    }
}

fn prefer_stdout(stdout: String, stderr: String) -> String {
    if stdout.is_empty() { stderr } else { stdout }
}

/// Pull bulleted and numbered lines out of a markdown report.
fn extract_findings(report: &str) -> Vec<String> {
    report
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("- ") || starts_with_number(line))
        .take(MAX_FINDINGS)
        .map(str::to_string)
        .collect()
}

fn starts_with_number(line: &str) -> bool {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with('.')
}

/// Remove a leading `- ` or `3.` style list marker.
fn strip_list_marker(finding: &str) -> &str {
    finding.trim_start_matches(|c: char| {
        c == '-' || c == '.' || c.is_ascii_digit() || c.is_whitespace()
    })
}
