use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sprint_state::FinalQaStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestsStatus {
    NotRun,
    Passing,
    Failing,
}

/// The `agent_status` subobject of `status.json` — written exclusively by the
/// agent subprocess (spec §3 "Ownership"). The orchestrator must treat this
/// as read-only and preserve it verbatim across its own writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub role: String,
    pub phase: String,
    pub sprint: u32,
    #[serde(default)]
    pub tasks_completed: Vec<String>,
    #[serde(default)]
    pub tasks_remaining: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub story_points_done: i32,
    pub tests_status: TestsStatus,
    pub phase_complete: bool,
    #[serde(default)]
    pub project_done: bool,
    #[serde(default)]
    pub next_action: Option<String>,
    /// Set by the agent only during the `final_qa` phase (spec §4.3 "Final QA
    /// gate"); absent in every other phase's status report.
    #[serde(default)]
    pub final_qa_status: Option<FinalQaStatus>,
    pub last_updated: DateTime<Utc>,
}

/// The shared `status.json` document: orchestrator-owned fields alongside the
/// agent-owned `agent_status` subobject. Orchestrator fields are modeled as a
/// raw `Value` map so new orchestrator-only keys can be added without forcing
/// a schema bump that would risk clobbering `agent_status` on deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusDoc {
    #[serde(default)]
    pub agent_status: Option<AgentStatus>,
    #[serde(flatten)]
    pub orchestrator_fields: serde_json::Map<String, Value>,
}

impl StatusDoc {
    /// Set an orchestrator-owned field without touching `agent_status`.
    pub fn set_orchestrator_field(&mut self, key: &str, value: Value) {
        self.orchestrator_fields.insert(key.to_string(), value);
    }
}
