use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initialization,
    Planning,
    Implementation,
    Qa,
    Review,
    FinalQa,
}

impl Phase {
    /// The regular (non-final-QA) phase that follows this one, with the
    /// implementation/qa feedback arc handled separately by the rework logic.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Initialization => Some(Phase::Planning),
            Phase::Planning => Some(Phase::Implementation),
            Phase::Implementation => Some(Phase::Qa),
            Phase::Qa => Some(Phase::Review),
            Phase::Review => None,
            Phase::FinalQa => None,
        }
    }

    pub fn role(self) -> &'static str {
        match self {
            Phase::Initialization => "product_owner",
            Phase::Planning => "product_owner",
            Phase::Implementation => "developer",
            Phase::Qa => "qa",
            Phase::Review => "product_owner",
            Phase::FinalQa => "qa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalQaStatus {
    NotRun,
    InProgress,
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintOutcome {
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintHistoryEntry {
    pub sprint: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: Option<SprintOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintState {
    pub current_sprint: u32,
    pub current_phase: Phase,
    pub phase_loop_count: u32,
    pub rework_count: u32,
    pub project_done: bool,
    pub final_qa_status: FinalQaStatus,
    pub final_qa_attempts: u32,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub sprints_history: Vec<SprintHistoryEntry>,
}

impl Default for SprintState {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            current_sprint: 0,
            current_phase: Phase::Initialization,
            phase_loop_count: 0,
            rework_count: 0,
            project_done: false,
            final_qa_status: FinalQaStatus::NotRun,
            final_qa_attempts: 0,
            started_at: now,
            last_updated: now,
            sprints_history: Vec::new(),
        }
    }
}

impl SprintState {
    /// Spec §4.3 "Resume detection": true whenever re-entering the process
    /// would otherwise risk double-incrementing `current_sprint`.
    pub fn is_resuming(&self, sprint_has_assigned_tasks: bool) -> bool {
        if self.current_sprint == 0 {
            return false;
        }
        matches!(
            self.current_phase,
            Phase::Implementation | Phase::Qa | Phase::Review | Phase::FinalQa
        ) || (self.current_phase == Phase::Planning && sprint_has_assigned_tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_tour_is_linear_with_no_cycle_back_from_review() {
        assert_eq!(Phase::Initialization.next(), Some(Phase::Planning));
        assert_eq!(Phase::Planning.next(), Some(Phase::Implementation));
        assert_eq!(Phase::Implementation.next(), Some(Phase::Qa));
        assert_eq!(Phase::Qa.next(), Some(Phase::Review));
        assert_eq!(Phase::Review.next(), None);
    }

    #[test]
    fn role_per_phase_matches_spec_table() {
        assert_eq!(Phase::Initialization.role(), "product_owner");
        assert_eq!(Phase::Planning.role(), "product_owner");
        assert_eq!(Phase::Implementation.role(), "developer");
        assert_eq!(Phase::Qa.role(), "qa");
        assert_eq!(Phase::Review.role(), "product_owner");
        assert_eq!(Phase::FinalQa.role(), "qa");
    }

    #[test]
    fn resume_detection_before_any_sprint_is_false() {
        let state = SprintState::default();
        assert!(!state.is_resuming(false));
    }

    #[test]
    fn resume_detection_true_mid_sprint() {
        let mut state = SprintState::default();
        state.current_sprint = 1;
        state.current_phase = Phase::Implementation;
        assert!(state.is_resuming(false));
    }

    #[test]
    fn resume_detection_in_planning_needs_assigned_tasks() {
        let mut state = SprintState::default();
        state.current_sprint = 1;
        state.current_phase = Phase::Planning;
        assert!(!state.is_resuming(false));
        assert!(state.is_resuming(true));
    }
}
