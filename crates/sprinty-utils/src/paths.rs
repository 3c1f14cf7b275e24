//! Centralized path constants for the project filesystem layout (spec §6).
//! Grounded in the teacher's `Paths` struct of associated constants, carried
//! over verbatim as a pattern and re-keyed to Sprinty's own layout.

use std::path::{Path, PathBuf};

pub struct Paths;

impl Paths {
    pub const STATE_DIR: &'static str = ".sprinty";
    pub const CONFIG_JSON: &'static str = ".sprinty/config.json";
    pub const SPRINT_STATE_JSON: &'static str = ".sprinty/sprint_state.json";
    pub const STATUS_JSON: &'static str = ".sprinty/status.json";
    pub const CIRCUIT_BREAKER_STATE: &'static str = ".sprinty/.circuit_breaker_state";
    pub const CIRCUIT_BREAKER_HISTORY: &'static str = ".sprinty/.circuit_breaker_history";
    pub const RATE_LIMIT_STATE: &'static str = ".sprinty/.rate_limit_state";
    pub const EXIT_SIGNALS: &'static str = ".sprinty/.exit_signals";
    pub const METRICS_JSON: &'static str = ".sprinty/metrics.json";

    pub const BACKLOG_JSON: &'static str = "backlog.json";
    pub const SPRINTS_DIR: &'static str = "sprints";
    pub const REVIEWS_DIR: &'static str = "reviews";
    pub const AGENT_OUTPUT_DIR: &'static str = "logs/agent_output";
    pub const FIX_PLAN: &'static str = "@fix_plan.md";
    pub const PROMPTS_DIR: &'static str = ".sprinty/prompts";
}

/// Whether `root` already has an initialized `.sprinty/` state directory.
pub fn is_initialized(root: &Path) -> bool {
    root.join(Paths::STATE_DIR).exists()
}

pub fn state_dir(root: &Path) -> PathBuf {
    root.join(Paths::STATE_DIR)
}

pub fn backlog_path(root: &Path) -> PathBuf {
    root.join(Paths::BACKLOG_JSON)
}

pub fn sprint_plan_path(root: &Path, sprint_id: u32) -> PathBuf {
    root.join(Paths::SPRINTS_DIR).join(format!("sprint_{sprint_id}")).join("plan.md")
}

/// The alternate contract shape for a sprint plan document (spec §4.3 allows
/// either this or [`sprint_plan_path`]).
pub fn sprint_plan_path_alt(root: &Path, sprint_id: u32) -> PathBuf {
    root.join(Paths::SPRINTS_DIR).join(format!("sprint_{sprint_id}_plan.md"))
}

/// True if a sprint plan document exists at either contract path.
pub fn sprint_plan_exists(root: &Path, sprint_id: u32) -> bool {
    sprint_plan_path(root, sprint_id).exists() || sprint_plan_path_alt(root, sprint_id).exists()
}

pub fn sprint_review_path(root: &Path, sprint_id: u32) -> PathBuf {
    root.join(Paths::REVIEWS_DIR).join(format!("sprint_{sprint_id}_review.md"))
}

/// The alternate contract shape for a sprint review document (spec §4.3
/// allows either this or [`sprint_review_path`]).
pub fn sprint_review_path_alt(root: &Path, sprint_id: u32) -> PathBuf {
    root.join(Paths::REVIEWS_DIR).join(format!("sprint_{sprint_id}")).join("review.md")
}

/// True if a sprint review document exists at either contract path.
pub fn sprint_review_exists(root: &Path, sprint_id: u32) -> bool {
    sprint_review_path(root, sprint_id).exists() || sprint_review_path_alt(root, sprint_id).exists()
}

pub fn final_qa_report_path(root: &Path) -> PathBuf {
    root.join(Paths::REVIEWS_DIR).join("final_qa_report.md")
}

pub fn agent_output_dir(root: &Path) -> PathBuf {
    root.join(Paths::AGENT_OUTPUT_DIR)
}

pub fn fix_plan_path(root: &Path) -> PathBuf {
    root.join(Paths::FIX_PLAN)
}

pub fn prompts_dir(root: &Path) -> PathBuf {
    root.join(Paths::PROMPTS_DIR)
}

/// Ensure the full `.sprinty/` layout exists (state dir, sprints/, reviews/,
/// logs/agent_output/). Idempotent.
pub fn ensure_layout(root: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(state_dir(root))?;
    std::fs::create_dir_all(root.join(Paths::SPRINTS_DIR))?;
    std::fs::create_dir_all(root.join(Paths::REVIEWS_DIR))?;
    std::fs::create_dir_all(agent_output_dir(root))?;
    std::fs::create_dir_all(prompts_dir(root))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_constants_match_spec_layout() {
        assert_eq!(Paths::STATE_DIR, ".sprinty");
        assert_eq!(Paths::BACKLOG_JSON, "backlog.json");
        assert_eq!(Paths::AGENT_OUTPUT_DIR, "logs/agent_output");
    }

    #[test]
    fn is_initialized_false_until_ensure_layout_runs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_initialized(dir.path()));
        ensure_layout(dir.path()).unwrap();
        assert!(is_initialized(dir.path()));
    }

    #[test]
    fn sprint_plan_path_is_keyed_by_sprint_number() {
        let root = Path::new("/project");
        assert_eq!(sprint_plan_path(root, 3), Path::new("/project/sprints/sprint_3/plan.md"));
    }

    #[test]
    fn sprint_plan_exists_accepts_either_contract_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!sprint_plan_exists(dir.path(), 1));

        std::fs::create_dir_all(dir.path().join("sprints")).unwrap();
        std::fs::write(dir.path().join("sprints/sprint_1_plan.md"), "plan").unwrap();
        assert!(sprint_plan_exists(dir.path(), 1));
        assert!(!sprint_plan_exists(dir.path(), 2));
    }

    #[test]
    fn sprint_review_exists_accepts_either_contract_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!sprint_review_exists(dir.path(), 1));

        std::fs::create_dir_all(dir.path().join("reviews/sprint_1")).unwrap();
        std::fs::write(dir.path().join("reviews/sprint_1/review.md"), "review").unwrap();
        assert!(sprint_review_exists(dir.path(), 1));
    }
}
