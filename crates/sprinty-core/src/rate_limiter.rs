//! Fixed-hourly-window rate limiter (spec §4.5). Persisted to disk (not an
//! in-memory token bucket) so the call count survives orchestrator restarts
//! within the same hour.

use std::path::{Path, PathBuf};

use sprinty_data::clock::hour_bucket;
use sprinty_data::{store, RateLimiterConfig, RateLimiterState, Result};

pub struct RateLimiter {
    path: PathBuf,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(path: impl Into<PathBuf>, config: RateLimiterConfig) -> Self {
        Self { path: path.into(), config }
    }

    pub fn load(&self) -> Result<RateLimiterState> {
        store::read_json(&self.path)
    }

    /// Roll the bucket over if the stored hour no longer matches the current
    /// one; otherwise leave the count as-is.
    fn roll_bucket(state: &mut RateLimiterState) {
        let current = hour_bucket();
        if state.hour_bucket != current {
            state.hour_bucket = current;
            state.current_calls = 0;
        }
    }

    pub fn can_call(&self) -> Result<bool> {
        let count = store::update::<RateLimiterState, _, _>(&self.path, |state| {
            Self::roll_bucket(state);
            state.current_calls
        })?;
        Ok(count < self.config.max_calls_per_hour)
    }

    /// Atomically increment and return the new count for the current hour.
    pub fn increment(&self) -> Result<u32> {
        store::update::<RateLimiterState, _, _>(&self.path, |state| {
            Self::roll_bucket(state);
            state.current_calls += 1;
            state.session_total_calls += 1;
            state.current_calls
        })
    }

    pub fn record_hit(&self) -> Result<()> {
        store::update::<RateLimiterState, _, _>(&self.path, |state| {
            state.rate_limit_hits += 1;
        })
    }

    pub fn reset(&self) -> Result<()> {
        store::update::<RateLimiterState, _, _>(&self.path, |state| {
            state.hour_bucket = hour_bucket();
            state.current_calls = 0;
        })
    }

    /// Optional cooperative delay between calls; a no-op helper for callers
    /// that want to throttle below the hard hourly cap.
    pub async fn wait_between_calls(&self, seconds: u64) {
        if seconds > 0 {
            tokio::time::sleep(std::time::Duration::from_secs(seconds)).await;
        }
    }
}

pub fn rate_limit_state_path(state_dir: &Path) -> PathBuf {
    state_dir.join(".rate_limit_state")
}
