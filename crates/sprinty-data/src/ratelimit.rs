use serde::{Deserialize, Serialize};

/// `.rate_limit_state`: current-hour counter plus session-lifetime totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterState {
    pub hour_bucket: String,
    pub current_calls: u32,
    pub session_total_calls: u64,
    pub rate_limit_hits: u64,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self {
            hour_bucket: crate::clock::hour_bucket(),
            current_calls: 0,
            session_total_calls: 0,
            rate_limit_hits: 0,
        }
    }
}
