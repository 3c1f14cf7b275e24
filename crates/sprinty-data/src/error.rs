use thiserror::Error;

pub type Result<T> = std::result::Result<T, SprintyError>;

#[derive(Error, Debug)]
pub enum SprintyError {
    #[error("state file corrupt: {0}")]
    StateCorrupt(String),

    #[error("agent status missing or invalid: {0}")]
    StatusMissing(String),

    #[error("agent reported role '{reported}' but orchestrator invoked '{expected}'")]
    RoleMismatch { reported: String, expected: String },

    #[error("agent invocation timed out after {0}s")]
    Timeout(u64),

    #[error("rate limit exceeded for current hour window")]
    RateLimited,

    #[error("connection error talking to agent: {0}")]
    ConnectionError(String),

    #[error("agent process was killed (signal {0})")]
    Killed(i32),

    #[error("agent invocation failed: {0}")]
    Unknown(String),

    #[error("agent authentication failed: {0}")]
    AuthError(String),

    #[error("permission denied: {0}")]
    PermissionError(String),

    #[error("circuit breaker is open: {0}")]
    CircuitOpen(String),

    #[error("maximum sprint count reached")]
    MaxSprintsReached,

    #[error("project complete")]
    ProjectComplete,

    #[error("work item not found: {0}")]
    ItemNotFound(String),

    #[error("backlog already initialized")]
    AlreadyInitialized,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
