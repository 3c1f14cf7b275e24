//! Strict status extraction (spec §4.6 "Strict status extraction"): after the
//! subprocess returns, the driver must validate `status.json` before the
//! orchestrator is allowed to advance.

use std::path::Path;

use sprinty_data::{store, AgentStatus, Result, StatusDoc, SprintyError};

/// Read `status.json` and validate it against the role the orchestrator
/// invoked. Any violation returns `StatusMissing` — the orchestrator must
/// treat this as a protocol violation and refuse to advance.
pub fn extract_and_validate(status_path: &Path, expected_role: &str) -> Result<AgentStatus> {
    let doc: StatusDoc = store::read_json(status_path)?;

    let agent_status = doc
        .agent_status
        .ok_or_else(|| SprintyError::StatusMissing("status.json has no agent_status object".to_string()))?;

    if agent_status.role.trim().is_empty() {
        return Err(SprintyError::StatusMissing("agent_status.role is empty".to_string()));
    }

    if agent_status.role != expected_role {
        return Err(SprintyError::RoleMismatch {
            reported: agent_status.role,
            expected: expected_role.to_string(),
        });
    }

    Ok(agent_status)
}
