//! `sprinty init <project> [--prd <file>]` (spec §6). Grounded in the
//! teacher's `init::run` directory-scaffolding flow, re-pointed at Sprinty's
//! `.sprinty/` control-plane layout instead of `.autoflow/`.

use std::path::Path;

use colored::*;
use sprinty_core::BacklogEngine;
use sprinty_data::Config;
use tracing::info;

pub async fn run(root: &Path, project: &str, prd: Option<&str>) -> anyhow::Result<i32> {
    println!("{}", "Initializing Sprinty project...".bright_cyan().bold());

    if sprinty_utils::is_initialized(root) {
        println!("{}", "Already initialized. Remove .sprinty/ to reinitialize.".yellow());
        return Ok(1);
    }

    sprinty_utils::ensure_layout(root)?;
    info!("control-plane directories created");

    let config = Config::load_or_init(root.join(sprinty_utils::paths::Paths::CONFIG_JSON))?;
    info!("config.json written with defaults");

    let backlog = BacklogEngine::new(sprinty_utils::backlog_path(root));
    backlog.init(project)?;
    println!("  {} backlog.json created for project '{}'", "✓".green(), project.bright_blue());

    if let Some(prd_path) = prd {
        let content = std::fs::read_to_string(prd_path)
            .map_err(|e| anyhow::anyhow!("failed to read PRD file {prd_path}: {e}"))?;
        std::fs::write(root.join("PRD.md"), content)?;
        println!("  {} PRD copied from {} to PRD.md", "✓".green(), prd_path.bright_blue());
    }

    println!(
        "  {} agent timeout {}s, max {} sprints",
        "✓".green(),
        config.agent.timeout_secs,
        config.sprint.max_sprints
    );

    println!("\n{}", "Project initialized.".green().bold());
    println!("Run {} to start the orchestrator loop.", "sprinty run".bright_blue());

    Ok(0)
}
