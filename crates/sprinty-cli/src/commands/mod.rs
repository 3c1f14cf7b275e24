pub mod backlog;
pub mod init;
pub mod metrics;
pub mod run;
pub mod status;

use std::path::Path;

use colored::*;

/// `--reset-circuit`: force the breaker closed before the rest of the command runs.
pub fn reset_circuit(root: &Path) -> anyhow::Result<()> {
    let state_dir = sprinty_utils::state_dir(root);
    let breaker = sprinty_core::CircuitBreaker::new(
        state_dir.join(".circuit_breaker_state"),
        state_dir.join(".circuit_breaker_history"),
        sprinty_data::CircuitBreakerConfig::default(),
    );
    breaker.reset("manual reset via --reset-circuit")?;
    println!("{}", "Circuit breaker reset to closed.".bright_green());
    Ok(())
}
