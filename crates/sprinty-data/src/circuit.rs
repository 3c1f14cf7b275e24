use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    HalfOpen,
    Open,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub state: BreakerState,
    pub consecutive_no_progress: u32,
    pub consecutive_same_error: u32,
    pub last_progress_loop: u32,
    pub total_opens: u32,
    pub reason: Option<String>,
    pub current_loop: u32,
    pub last_change: DateTime<Utc>,
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_no_progress: 0,
            consecutive_same_error: 0,
            last_progress_loop: 0,
            total_opens: 0,
            reason: None,
            current_loop: 0,
            last_change: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitTransition {
    pub timestamp: DateTime<Utc>,
    pub from: BreakerState,
    pub to: BreakerState,
    pub reason: String,
    pub loop_number: u32,
}

/// `.circuit_breaker_history`: append-only array of every transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitBreakerHistory(pub Vec<CircuitTransition>);
