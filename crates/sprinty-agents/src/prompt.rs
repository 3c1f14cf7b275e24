//! Prompt assembly and context generation (spec §4.6), grounded in the
//! teacher's `build_agent_context` (static template + interpolated sprint
//! facts), generalized from one fixed sprint-report shape to the role/phase
//! template lookup the spec requires.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sprinty_data::{Backlog, ItemStatus, Result, SprintyError};

pub const SPRINTY_IN_CONTAINER_ENV: &str = "SPRINTY_IN_CONTAINER";

const SANDBOX_ADDENDUM: &str = "\n## Container Environment\n\nYou are running inside a sandboxed container. Filesystem access is limited \
to the project working directory; network access may be restricted. Do not assume host-level tools are available beyond what this \
container provides.\n";

const STATUS_REMINDER: &str = "\n## Status Reporting (required)\n\nYour response MUST contain a status block, delimited exactly as:\n\n\
---SPRINTY_STATUS---\nKEY: value\n---END_SPRINTY_STATUS---\n\nand you must also have written `agent_status` into `status.json` before exiting.\n";

#[derive(Debug, Serialize)]
pub struct BacklogCounts {
    pub total_items: u32,
    pub total_points: i32,
    pub by_status: std::collections::BTreeMap<String, u32>,
}

#[derive(Debug, Serialize)]
pub struct SprintStats {
    pub items_in_sprint: u32,
    pub planned_points: i32,
    pub completed_points: i32,
}

#[derive(Debug, Serialize)]
pub struct AgentContext {
    pub sprint_id: u32,
    pub phase: String,
    pub backlog: BacklogCounts,
    pub sprint_stats: SprintStats,
}

/// Build the JSON context block (spec §4.6 "Context generation").
pub fn build_context(sprint_id: u32, phase: &str, backlog: &Backlog) -> AgentContext {
    let mut by_status = std::collections::BTreeMap::new();
    for item in &backlog.items {
        *by_status.entry(format!("{:?}", item.status)).or_insert(0u32) += 1;
    }

    let in_sprint: Vec<_> = backlog.items.iter().filter(|i| i.sprint_id == Some(sprint_id)).collect();
    let planned_points = in_sprint.iter().map(|i| i.story_points).sum();
    let completed_points = in_sprint
        .iter()
        .filter(|i| i.status == ItemStatus::Done)
        .map(|i| i.story_points)
        .sum();

    AgentContext {
        sprint_id,
        phase: phase.to_string(),
        backlog: BacklogCounts {
            total_items: backlog.metadata.total_items,
            total_points: backlog.metadata.total_points,
            by_status,
        },
        sprint_stats: SprintStats {
            items_in_sprint: in_sprint.len() as u32,
            planned_points,
            completed_points,
        },
    }
}

/// Assemble the full prompt text and write it to
/// `AGENT_OUTPUT_DIR/prompt_<role>_<phase>_sprint<N>.md`. Returns the path.
pub fn assemble_prompt(
    prompts_dir: &Path,
    agent_output_dir: &Path,
    role: &str,
    phase: &str,
    sprint_id: u32,
    context: &AgentContext,
) -> Result<PathBuf> {
    let template_name = if phase == "final_qa" { "final_qa.md".to_string() } else { format!("{role}.md") };
    let template_path = prompts_dir.join(&template_name);
    let base = fs::read_to_string(&template_path)
        .map_err(|_| SprintyError::Unknown(format!("missing prompt template {}", template_path.display())))?;

    let mut prompt = base;
    if std::env::var(SPRINTY_IN_CONTAINER_ENV).as_deref() == Ok("true") {
        prompt.push_str(SANDBOX_ADDENDUM);
    }

    let context_json = serde_json::to_string_pretty(context)?;
    prompt.push_str(&format!(
        "\n## Current Context\n\nSprint: {sprint_id}\nPhase: {phase}\nRole: {role}\nTimestamp: {}\nEnvironment: {}\n\n```json\n{context_json}\n```\n",
        Utc::now().to_rfc3339(),
        if std::env::var(SPRINTY_IN_CONTAINER_ENV).as_deref() == Ok("true") { "container" } else { "host" },
    ));

    prompt.push_str(STATUS_REMINDER);

    fs::create_dir_all(agent_output_dir)?;
    let out_path = agent_output_dir.join(format!("prompt_{role}_{phase}_sprint{sprint_id}.md"));
    fs::write(&out_path, &prompt)?;
    Ok(out_path)
}

/// Parse the optional `---SPRINTY_STATUS---` / `---END_SPRINTY_STATUS---`
/// delimited `KEY: value` block from stdout (spec §6 glossary "Status block").
pub fn parse_status_block(stdout: &str) -> Option<std::collections::BTreeMap<String, String>> {
    let start = stdout.find("---SPRINTY_STATUS---")? + "---SPRINTY_STATUS---".len();
    let end = stdout[start..].find("---END_SPRINTY_STATUS---")? + start;
    let body = &stdout[start..end];

    let mut map = std::collections::BTreeMap::new();
    for line in body.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                map.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    Some(map)
}

pub fn json_value_for_context(context: &AgentContext) -> serde_json::Value {
    json!(context)
}
