//! Sprint/phase state machine (spec §4.3): linear phase tour with one
//! feedback arc (`implementation ⇄ qa`), bounded per-phase loops, the rework
//! cycle, and the terminal final-QA gate.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sprinty_data::sprint_state::{FinalQaStatus, Phase, SprintHistoryEntry, SprintOutcome};
use sprinty_data::{store, PhaseLoopLimits, Result, SprintState, SprintyError};

pub struct SprintMachine {
    path: PathBuf,
}

impl SprintMachine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<SprintState> {
        store::read_json(&self.path)
    }

    fn save(&self, f: impl FnOnce(&mut SprintState)) -> Result<SprintState> {
        store::update::<SprintState, _, _>(&self.path, |state| {
            f(state);
            state.last_updated = Utc::now();
            state.clone()
        })
    }

    /// Increments `current_sprint`. Must be called exactly once per sprint —
    /// never on resume (spec §9 "Resume semantics").
    pub fn start_sprint(&self, max_sprints: u32) -> Result<SprintState> {
        store::update::<SprintState, _, _>(&self.path, |state| -> Result<SprintState> {
            let next = state.current_sprint + 1;
            if next > max_sprints {
                return Err(SprintyError::MaxSprintsReached);
            }
            state.current_sprint = next;
            state.phase_loop_count = 0;
            state.rework_count = 0;
            state.current_phase = Phase::Planning;
            state.last_updated = Utc::now();
            state.sprints_history.push(SprintHistoryEntry {
                sprint: next,
                started_at: state.last_updated,
                ended_at: None,
                status: None,
            });
            Ok(state.clone())
        })?
    }

    /// Records the outcome in history and resets `current_phase` to
    /// `planning` so a later resume check doesn't mistake a finished sprint
    /// for one still in flight. `current_sprint` is left unchanged.
    pub fn end_sprint(&self, outcome: SprintOutcome) -> Result<SprintState> {
        self.save(|state| {
            let ended_at = Utc::now();
            if let Some(entry) = state
                .sprints_history
                .iter_mut()
                .rev()
                .find(|e| e.sprint == state.current_sprint)
            {
                entry.ended_at = Some(ended_at);
                entry.status = Some(outcome);
            }
            state.current_phase = Phase::Planning;
        })
    }

    pub fn is_resuming(&self, sprint_has_assigned_tasks: bool) -> Result<bool> {
        Ok(self.load()?.is_resuming(sprint_has_assigned_tasks))
    }

    /// Bound a phase's loop count against its configured `max_loops`.
    pub fn loop_limit_exceeded(&self, limits: &PhaseLoopLimits) -> Result<bool> {
        let state = self.load()?;
        let max = phase_limit(state.current_phase, limits);
        Ok(state.phase_loop_count >= max)
    }

    pub fn increment_phase_loop(&self) -> Result<u32> {
        self.save(|state| state.phase_loop_count += 1).map(|s| s.phase_loop_count)
    }

    /// Advance to the next regular phase, resetting the loop counter.
    /// A no-op (returns the unchanged phase) if already at `review`.
    pub fn advance_phase(&self) -> Result<Phase> {
        store::update::<SprintState, _, _>(&self.path, |state| {
            if let Some(next) = state.current_phase.next() {
                state.current_phase = next;
                state.phase_loop_count = 0;
            }
            state.last_updated = Utc::now();
            state.current_phase
        })
    }

    /// The rework arc: at end of `qa`, any `qa_failed` item sends the sprint
    /// back to `implementation` and bumps `rework_count`. Returns `true` if
    /// the rework limit was hit and the sprint must be aborted instead.
    pub fn enter_rework(&self, rework_limit: u32) -> Result<bool> {
        store::update::<SprintState, _, _>(&self.path, |state| {
            state.rework_count += 1;
            let exhausted = state.rework_count > rework_limit;
            if !exhausted {
                state.current_phase = Phase::Implementation;
                state.phase_loop_count = 0;
            }
            state.last_updated = Utc::now();
            exhausted
        })
    }

    pub fn enter_final_qa(&self) -> Result<()> {
        self.save(|state| {
            state.current_phase = Phase::FinalQa;
            state.phase_loop_count = 0;
            state.final_qa_status = FinalQaStatus::InProgress;
        })
        .map(|_| ())
    }

    pub fn record_final_qa_outcome(&self, status: FinalQaStatus) -> Result<SprintState> {
        self.save(|state| {
            state.final_qa_status = status;
            state.final_qa_attempts += 1;
        })
    }

    pub fn needs_final_qa_sprint(&self, backlog_complete: bool, max_attempts: u32) -> Result<bool> {
        let state = self.load()?;
        Ok(backlog_complete && state.final_qa_status != FinalQaStatus::Passed && state.final_qa_attempts < max_attempts)
    }

    pub fn is_project_complete(&self, backlog_complete: bool) -> Result<bool> {
        let state = self.load()?;
        Ok(backlog_complete && state.final_qa_status == FinalQaStatus::Passed)
    }

    pub fn mark_project_done(&self) -> Result<()> {
        self.save(|state| state.project_done = true).map(|_| ())
    }
}

fn phase_limit(phase: Phase, limits: &PhaseLoopLimits) -> u32 {
    match phase {
        Phase::Initialization => 1,
        Phase::Planning => limits.planning,
        Phase::Implementation => limits.implementation,
        Phase::Qa => limits.qa,
        Phase::Review => limits.review,
        Phase::FinalQa => limits.final_qa,
    }
}

pub fn sprint_state_path(state_dir: &Path) -> PathBuf {
    state_dir.join("sprint_state.json")
}
