// Sprinty Core - state machines, control-plane primitives, and the
// orchestrator loop that drives an external coding agent.

pub mod backlog;
pub mod circuit_breaker;
pub mod done_detector;
pub mod orchestrator;
#[cfg(test)]
mod proptests;
pub mod rate_limiter;
#[cfg(test)]
mod scenarios;
pub mod sprint_machine;
pub mod vcs;

pub use backlog::BacklogEngine;
pub use circuit_breaker::{CircuitBreaker, LoopObservation};
pub use done_detector::{DetectorInputs, DoneDetector, LoopSignals};
pub use orchestrator::{ExitCode, Orchestrator};
pub use rate_limiter::RateLimiter;
pub use sprint_machine::SprintMachine;
pub use vcs::{ChangeMeasurement, MtimeManifest};
