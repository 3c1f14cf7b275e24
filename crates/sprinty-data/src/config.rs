use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::Result;

/// Tuning knobs for the whole control plane, loaded from `STATE_DIR/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub agent: AgentConfig,
    pub sprint: SprintConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub rate_limiter: RateLimiterConfig,
    pub done_detector: DoneDetectorConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load from `path` if present, otherwise materialize and persist the defaults.
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            sprint: SprintConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            done_detector: DoneDetectorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentFlavor {
    OpenCode,
    CursorAgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub binary: String,
    pub flavor: AgentFlavor,
    #[serde(default)]
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: "opencode".to_string(),
            flavor: AgentFlavor::OpenCode,
            model: None,
            timeout_secs: 600,
            max_retries: 3,
            base_delay_ms: 2_000,
        }
    }
}

impl AgentConfig {
    /// Priority: env override > per-invocation override > configured default.
    pub fn effective_model(&self) -> Option<String> {
        if let Ok(env_model) = std::env::var("SPRINTY_MODEL") {
            return Some(env_model);
        }
        self.model.clone()
    }
}

/// Per-phase bounded-loop limits (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseLoopLimits {
    pub planning: u32,
    pub implementation: u32,
    pub qa: u32,
    pub review: u32,
    pub final_qa: u32,
}

impl Default for PhaseLoopLimits {
    fn default() -> Self {
        Self {
            planning: 3,
            implementation: 20,
            qa: 5,
            review: 2,
            final_qa: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintConfig {
    pub max_sprints: u32,
    pub rework_limit: u32,
    pub max_loops: PhaseLoopLimits,
    pub max_final_qa_attempts: u32,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            max_sprints: 10,
            rework_limit: 3,
            max_loops: PhaseLoopLimits::default(),
            max_final_qa_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub no_progress_threshold: u32,
    pub same_error_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            no_progress_threshold: 3,
            same_error_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    pub max_calls_per_hour: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_calls_per_hour: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoneDetectorConfig {
    pub max_idle_loops: u32,
    pub max_done_signals: u32,
    pub max_test_only_loops: u32,
}

impl Default for DoneDetectorConfig {
    fn default() -> Self {
        Self {
            max_idle_loops: 5,
            max_done_signals: 3,
            max_test_only_loops: 5,
        }
    }
}
