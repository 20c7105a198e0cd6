//! Control plane orchestration for deskpilot.
//!
//! Owns the persisted application document and wires the provider
//! router, process managers, sandbox, and MCP prober into the boundary
//! operations the presentation layer calls.

pub mod error;
pub mod plane;
pub mod records;
pub mod state;
pub mod store;

/// Core error type.
pub use error::CoreError;
/// Boundary operations and their result shapes.
pub use plane::{
    ActionResult, AgentPatch, Bootstrap, ChatOutcome, ControlPlane, McpTestOutcome, PathOutcome,
    PromoteOutcome, ReadOutcome, RenameOutcome, ResearchOutcome, RuntimeStatus, ServerAction,
    TerminalStarted, TreeOutcome,
};
/// Agent and research records.
pub use records::{AGENT_LOG_CAP, AgentRecord, PlanStep, ResearchJobRecord};
/// The persisted document.
pub use state::AppState;
/// Whole-document JSON persistence.
pub use store::StateStore;
