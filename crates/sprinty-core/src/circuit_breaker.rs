//! Circuit breaker (spec §4.4), per Nygard's *Release It* pattern: detects
//! stagnation (no file changes, repeated errors) and halts the orchestrator
//! loop rather than let it burn agent calls on a project that has stopped
//! moving.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sprinty_data::circuit::{BreakerState, CircuitBreakerHistory, CircuitTransition};
use sprinty_data::{store, CircuitBreakerConfig, CircuitBreakerState, Result};

pub struct LoopObservation {
    pub loop_number: u32,
    pub files_changed: u32,
    pub has_errors: bool,
}

pub struct CircuitBreaker {
    state_path: PathBuf,
    history_path: PathBuf,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(state_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>, config: CircuitBreakerConfig) -> Self {
        Self {
            state_path: state_path.into(),
            history_path: history_path.into(),
            config,
        }
    }

    pub fn load(&self) -> Result<CircuitBreakerState> {
        store::read_json(&self.state_path)
    }

    pub fn can_execute(&self) -> Result<bool> {
        Ok(!matches!(self.load()?.state, BreakerState::Open))
    }

    /// Feed one loop's observation into the breaker and apply the transition
    /// table. Every state change is appended to the history document.
    pub fn record(&self, obs: LoopObservation) -> Result<CircuitBreakerState> {
        let transition = store::update::<CircuitBreakerState, _, _>(&self.state_path, |cb| {
            cb.current_loop = obs.loop_number;

            if obs.files_changed > 0 {
                cb.consecutive_no_progress = 0;
                cb.last_progress_loop = obs.loop_number;
            } else {
                cb.consecutive_no_progress += 1;
            }

            if obs.has_errors {
                cb.consecutive_same_error += 1;
            } else {
                cb.consecutive_same_error = 0;
            }

            let from = cb.state;
            let progressed = obs.files_changed > 0;
            let to = next_state(from, progressed, cb.consecutive_no_progress, cb.consecutive_same_error, &self.config);

            if from != to {
                if to == BreakerState::Open {
                    cb.total_opens += 1;
                }
                cb.state = to;
                cb.reason = Some(transition_reason(from, to, progressed));
                cb.last_change = Utc::now();
            }

            if from != to {
                Some(CircuitTransition {
                    timestamp: cb.last_change,
                    from,
                    to,
                    reason: cb.reason.clone().unwrap_or_default(),
                    loop_number: obs.loop_number,
                })
            } else {
                None
            }
        })?;

        if let Some(transition) = transition {
            store::update::<CircuitBreakerHistory, _, _>(&self.history_path, |history| {
                history.0.push(transition);
            })?;
        }

        self.load()
    }

    pub fn reset(&self, reason: &str) -> Result<()> {
        store::update::<CircuitBreakerState, _, _>(&self.state_path, |cb| {
            let total_opens = cb.total_opens; // invariant 4: never decreases, even across reset
            *cb = CircuitBreakerState::default();
            cb.total_opens = total_opens;
            cb.reason = Some(reason.to_string());
            cb.last_change = Utc::now();
        })
    }
}

fn next_state(
    from: BreakerState,
    progressed: bool,
    no_progress: u32,
    same_error: u32,
    config: &CircuitBreakerConfig,
) -> BreakerState {
    match from {
        BreakerState::Closed => {
            if no_progress >= config.no_progress_threshold || same_error >= config.same_error_threshold {
                BreakerState::Open
            } else if no_progress >= 2 {
                BreakerState::HalfOpen
            } else {
                BreakerState::Closed
            }
        }
        BreakerState::HalfOpen => {
            if progressed {
                BreakerState::Closed
            } else if no_progress >= config.no_progress_threshold || same_error >= config.same_error_threshold {
                BreakerState::Open
            } else {
                BreakerState::HalfOpen
            }
        }
        BreakerState::Open => BreakerState::Open,
    }
}

fn transition_reason(from: BreakerState, to: BreakerState, progressed: bool) -> String {
    match (from, to) {
        (BreakerState::HalfOpen, BreakerState::Closed) => "recovered".to_string(),
        (_, BreakerState::Open) => "stagnation threshold exceeded".to_string(),
        (BreakerState::Closed, BreakerState::HalfOpen) => "no-progress streak".to_string(),
        _ if progressed => "progress observed".to_string(),
        _ => "no progress".to_string(),
    }
}

pub fn circuit_state_path(state_dir: &Path) -> PathBuf {
    state_dir.join(".circuit_breaker_state")
}

pub fn circuit_history_path(state_dir: &Path) -> PathBuf {
    state_dir.join(".circuit_breaker_history")
}
