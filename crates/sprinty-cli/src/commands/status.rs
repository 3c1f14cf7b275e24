//! `sprinty status [--check-done]` (spec §6). Grounded in the teacher's
//! `status::run` human-readable summary, re-keyed to Sprinty's sprint/phase/
//! backlog/circuit-breaker state instead of a flat `SPRINTS.yml`.

use std::path::Path;

use colored::*;
use sprinty_core::{BacklogEngine, CircuitBreaker, SprintMachine};
use sprinty_data::{CircuitBreakerConfig, ItemStatus};

pub async fn run(root: &Path, check_done: bool) -> anyhow::Result<i32> {
    if !sprinty_utils::is_initialized(root) {
        println!("{}", "No project found. Run 'sprinty init <project>' first.".yellow());
        return Ok(1);
    }

    let state_dir = sprinty_utils::state_dir(root);
    let sprint_machine = SprintMachine::new(sprinty_core::sprint_machine::sprint_state_path(&state_dir));
    let backlog = BacklogEngine::new(sprinty_utils::backlog_path(root));
    let circuit_breaker = CircuitBreaker::new(
        state_dir.join(".circuit_breaker_state"),
        state_dir.join(".circuit_breaker_history"),
        CircuitBreakerConfig::default(),
    );

    let sprint_state = sprint_machine.load()?;
    let backlog_complete = backlog.is_backlog_complete()?;
    let project_complete = sprint_machine.is_project_complete(backlog_complete)?;

    if check_done {
        println!("{}", if project_complete { "done" } else { "not_done" });
        return Ok(if project_complete { 0 } else { 1 });
    }

    println!("{}", "Sprinty Status".bright_cyan().bold());
    println!();
    println!("{}: {}", "Sprint".bright_white().bold(), sprint_state.current_sprint);
    println!("{}: {:?}", "Phase".bright_white().bold(), sprint_state.current_phase);
    println!("{}: {:?}", "Final QA".bright_white().bold(), sprint_state.final_qa_status);
    println!(
        "{}: {}",
        "Project complete".bright_white().bold(),
        if project_complete { "yes".green() } else { "no".yellow() }
    );

    let items = backlog.all()?;
    let total = items.len();
    let done = items.iter().filter(|i| i.status == ItemStatus::Done).count();
    let qa_failed = items.iter().filter(|i| i.status == ItemStatus::QaFailed).count();
    let in_progress = items
        .iter()
        .filter(|i| !matches!(i.status, ItemStatus::Done | ItemStatus::Cancelled | ItemStatus::Backlog))
        .count();

    println!();
    println!("{}", "Backlog:".bright_white().bold());
    println!("  {}: {}/{}", "Done".green(), done, total);
    if in_progress > 0 {
        println!("  {}: {}", "In progress".bright_blue(), in_progress);
    }
    if qa_failed > 0 {
        println!("  {}: {}", "QA failed".red(), qa_failed);
    }

    let breaker_state = circuit_breaker.load()?;
    println!();
    println!("{}: {:?}", "Circuit breaker".bright_white().bold(), breaker_state.state);
    if let Some(reason) = &breaker_state.reason {
        println!("  {}: {}", "Reason".bright_black(), reason);
    }

    Ok(0)
}
