//! `sprinty metrics` (spec §6): a point-in-time snapshot written to
//! `.sprinty/metrics.json` and echoed to stdout. The dashboard itself is out
//! of core scope (spec §1); this just assembles the numbers the core state
//! machines already expose.

use std::path::Path;

use serde::Serialize;
use sprinty_core::{BacklogEngine, CircuitBreaker, RateLimiter, SprintMachine};
use sprinty_data::{CircuitBreakerConfig, RateLimiterConfig};

#[derive(Serialize)]
struct MetricsSnapshot {
    current_sprint: u32,
    current_phase: String,
    total_items: usize,
    done_items: usize,
    qa_failed_items: usize,
    circuit_breaker_state: String,
    circuit_breaker_total_opens: u32,
    rate_limiter_calls_this_hour: u32,
    rate_limiter_session_total: u64,
}

pub async fn run(root: &Path) -> anyhow::Result<i32> {
    if !sprinty_utils::is_initialized(root) {
        anyhow::bail!("Project not initialized. Run 'sprinty init <project>' first.");
    }

    let state_dir = sprinty_utils::state_dir(root);
    let sprint_machine = SprintMachine::new(sprinty_core::sprint_machine::sprint_state_path(&state_dir));
    let backlog = BacklogEngine::new(sprinty_utils::backlog_path(root));
    let circuit_breaker = CircuitBreaker::new(
        state_dir.join(".circuit_breaker_state"),
        state_dir.join(".circuit_breaker_history"),
        CircuitBreakerConfig::default(),
    );
    let rate_limiter = RateLimiter::new(state_dir.join(".rate_limit_state"), RateLimiterConfig::default());

    let sprint_state = sprint_machine.load()?;
    let items = backlog.all()?;
    let breaker_state = circuit_breaker.load()?;
    let limiter_state = rate_limiter.load()?;

    let snapshot = MetricsSnapshot {
        current_sprint: sprint_state.current_sprint,
        current_phase: format!("{:?}", sprint_state.current_phase),
        total_items: items.len(),
        done_items: items.iter().filter(|i| i.status == sprinty_data::ItemStatus::Done).count(),
        qa_failed_items: items.iter().filter(|i| i.status == sprinty_data::ItemStatus::QaFailed).count(),
        circuit_breaker_state: format!("{:?}", breaker_state.state),
        circuit_breaker_total_opens: breaker_state.total_opens,
        rate_limiter_calls_this_hour: limiter_state.current_calls,
        rate_limiter_session_total: limiter_state.session_total_calls,
    };

    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(root.join(sprinty_utils::paths::Paths::METRICS_JSON), &json)?;
    println!("{json}");

    Ok(0)
}
