//! `sprinty run` (spec §6). Grounded in the teacher's `start::run` top-level
//! driving loop, collapsed down to Sprinty's single entry point: load config,
//! build an `Orchestrator`, run it to completion, map its `ExitCode` to the
//! process exit status.

use std::path::Path;

use colored::*;
use sprinty_core::{ExitCode, Orchestrator};
use sprinty_data::Config;

pub async fn run(root: &Path) -> anyhow::Result<i32> {
    if !sprinty_utils::is_initialized(root) {
        anyhow::bail!(
            "{}\nRun {} first",
            "Project not initialized.".red(),
            "sprinty init <project>".bright_blue()
        );
    }

    let config = Config::load_or_init(root.join(sprinty_utils::paths::Paths::CONFIG_JSON))?;
    println!("{}", "Starting orchestrator loop...".bright_cyan().bold());

    let mut orchestrator = Orchestrator::new(root, config);
    let code = orchestrator.run().await?;

    match code {
        ExitCode::Success => println!("{}", "Orchestrator exited normally.".green()),
        ExitCode::GenericError => println!("{}", "Orchestrator exited with an error.".red()),
        ExitCode::CircuitOpen => println!("{}", "Halted: circuit breaker is open.".red().bold()),
        ExitCode::ProjectComplete => println!("{}", "Project complete.".green().bold()),
        ExitCode::MaxSprintsReached => println!("{}", "Halted: maximum sprint count reached.".yellow().bold()),
    }

    Ok(code as i32)
}
