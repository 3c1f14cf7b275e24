//! The orchestrator loop (spec §4.8): glues the backlog engine, sprint
//! machine, circuit breaker, rate limiter, agent driver, and done detector
//! together into the ten numbered steps. Grounded in the teacher's
//! `Orchestrator::run_sprint` — an iteration loop with a `retry_count` map,
//! a save-after-each-iteration callback, and a distinguished blocked/failure
//! exit — generalized from a single fixed TDD phase sequence to Sprinty's
//! phase/rework/final-QA state machine.

use std::path::PathBuf;

use sprinty_agents::prompt::{assemble_prompt, build_context, parse_status_block};
use sprinty_agents::status_extract::extract_and_validate;
use sprinty_agents::{run_with_retry, write_output_log};
use sprinty_data::sprint_state::{FinalQaStatus, Phase, SprintOutcome};
use sprinty_data::{store, Config, ItemStatus, Result, SprintyError};

use crate::backlog::BacklogEngine;
use crate::circuit_breaker::{CircuitBreaker, LoopObservation};
use crate::done_detector::{contains_completion_indicator, DetectorInputs, DoneDetector, LoopSignals};
use crate::rate_limiter::RateLimiter;
use crate::sprint_machine::SprintMachine;
use crate::vcs::ChangeMeasurement;

/// Exit codes the CLI's `run` command maps into a process exit status
/// (spec §6 "Exit codes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GenericError = 1,
    CircuitOpen = 10,
    ProjectComplete = 20,
    MaxSprintsReached = 21,
}

pub struct Orchestrator {
    root: PathBuf,
    config: Config,
    backlog: BacklogEngine,
    sprint_machine: SprintMachine,
    circuit_breaker: CircuitBreaker,
    rate_limiter: RateLimiter,
    done_detector: DoneDetector,
    loop_number: u32,
}

impl Orchestrator {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        let root = root.into();
        let state_dir = sprinty_utils::state_dir(&root);

        let backlog = BacklogEngine::new(sprinty_utils::backlog_path(&root));
        let sprint_machine = SprintMachine::new(crate::sprint_machine::sprint_state_path(&state_dir));
        let circuit_breaker = CircuitBreaker::new(
            crate::circuit_breaker::circuit_state_path(&state_dir),
            crate::circuit_breaker::circuit_history_path(&state_dir),
            config.circuit_breaker.clone(),
        );
        let rate_limiter = RateLimiter::new(crate::rate_limiter::rate_limit_state_path(&state_dir), config.rate_limiter.clone());
        let done_detector = DoneDetector::new(
            crate::done_detector::exit_signals_path(&state_dir),
            Some(sprinty_utils::fix_plan_path(&root)),
            config.done_detector.clone(),
        );

        Self {
            root,
            config,
            backlog,
            sprint_machine,
            circuit_breaker,
            rate_limiter,
            done_detector,
            loop_number: 0,
        }
    }

    fn status_path(&self) -> PathBuf {
        self.root.join(sprinty_utils::paths::Paths::STATUS_JSON)
    }

    /// Run the loop until the done detector or circuit breaker ends it.
    /// Returns the terminal `ExitCode`.
    pub async fn run(&mut self) -> Result<ExitCode> {
        loop {
            match self.step().await {
                Ok(Some(code)) => return Ok(code),
                Ok(None) => continue,
                Err(SprintyError::CircuitOpen(_)) => return Ok(ExitCode::CircuitOpen),
                Err(SprintyError::ProjectComplete) => return Ok(ExitCode::ProjectComplete),
                Err(SprintyError::MaxSprintsReached) => return Ok(ExitCode::MaxSprintsReached),
                Err(e) => {
                    tracing::error!("orchestrator iteration failed: {e}");
                    return Ok(ExitCode::GenericError);
                }
            }
        }
    }

    /// One iteration of the ten-step loop. Returns `Ok(Some(code))` when the
    /// loop should stop, `Ok(None)` to continue.
    async fn step(&mut self) -> Result<Option<ExitCode>> {
        self.loop_number += 1;

        // 1. circuit breaker gate
        if !self.circuit_breaker.can_execute()? {
            tracing::error!("circuit breaker open, halting");
            return Err(SprintyError::CircuitOpen("breaker open".to_string()));
        }

        // 2. rate limiter gate
        if !self.rate_limiter.can_call()? {
            tracing::warn!("rate limit reached for this hour, waiting");
            self.rate_limiter.wait_between_calls(60).await;
            return Ok(None);
        }

        // 3. determine phase/role, respecting resume rules
        let sprint_has_assigned_tasks = !self
            .backlog
            .sprint_backlog(self.sprint_machine.load()?.current_sprint)?
            .is_empty();

        if !self.sprint_machine.is_resuming(sprint_has_assigned_tasks)? {
            self.sprint_machine.start_sprint(self.config.sprint.max_sprints)?;
        }

        let state = self.sprint_machine.load()?;
        let phase = state.current_phase;
        let role = phase.role();

        // 4. build prompt, invoke agent, record rate-limit increment
        let backlog_doc = store::read_json(&sprinty_utils::backlog_path(&self.root))?;
        let context = build_context(state.current_sprint, &format!("{phase:?}").to_lowercase(), &backlog_doc);
        let prompt_path = assemble_prompt(
            &sprinty_utils::prompts_dir(&self.root),
            &sprinty_utils::agent_output_dir(&self.root),
            role,
            &format!("{phase:?}").to_lowercase(),
            state.current_sprint,
            &context,
        )?;
        let prompt_text = std::fs::read_to_string(&prompt_path)?;

        self.rate_limiter.increment()?;
        let measurement = ChangeMeasurement::begin(&self.root)?;

        let outcome = run_with_retry(&self.config.agent, &prompt_text).await;
        write_output_log(
            &sprinty_utils::agent_output_dir(&self.root),
            role,
            &format!("{phase:?}").to_lowercase(),
            state.current_sprint,
            0,
            outcome.as_ref().map(|o| o.output.as_str()).unwrap_or_default(),
        )
        .await?;

        let has_errors = outcome.is_err();
        if let Err(SprintyError::RateLimited) = &outcome {
            self.rate_limiter.record_hit()?;
        }

        // 5. measure files changed
        let files_changed = measurement.finish().unwrap_or(0);

        // 6. feed the circuit breaker
        self.circuit_breaker.record(LoopObservation { loop_number: self.loop_number, files_changed, has_errors })?;

        // 7. strict status extraction
        let status_result = extract_and_validate(&self.status_path(), role);
        let agent_status = match status_result {
            Ok(status) => status,
            Err(_) => {
                self.sprint_machine.increment_phase_loop()?;
                self.done_detector.record(LoopSignals {
                    loop_number: self.loop_number,
                    idle: files_changed == 0,
                    done_signal: false,
                    completion_indicator: false,
                    test_only: false,
                })?;
                return Ok(None);
            }
        };

        // 8. apply backlog / sprint-state transitions implied by the status
        self.apply_status(phase, &agent_status)?;

        // 9. ask the done detector
        let backlog_complete = self.backlog.is_backlog_complete()?;
        let final_qa_passed = self.sprint_machine.load()?.final_qa_status == FinalQaStatus::Passed;

        // Secondary signal source (spec §4.6/§4.7): parse the raw SPRINTY_STATUS
        // block and scan the captured output for textual completion phrases,
        // instead of re-reading the strict JSON `agent_status` fields.
        let raw_output = outcome.as_ref().map(|o| o.output.as_str()).unwrap_or_default();
        let status_block_done = parse_status_block(raw_output)
            .as_ref()
            .and_then(|block| block.get("PROJECT_DONE"))
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        self.done_detector.record(LoopSignals {
            loop_number: self.loop_number,
            idle: files_changed == 0,
            done_signal: agent_status.project_done || status_block_done,
            completion_indicator: contains_completion_indicator(raw_output),
            test_only: false,
        })?;

        if let Some(_reason) = self.done_detector.should_exit(&DetectorInputs {
            backlog_complete,
            final_qa_passed,
            agent_reports_project_done: agent_status.project_done,
        })? {
            self.sprint_machine.mark_project_done()?;
            return Err(SprintyError::ProjectComplete);
        }

        // 10. increment phase loop, possibly transition phase / end sprint
        self.advance(phase, backlog_complete, &agent_status)?;

        Ok(None)
    }

    fn apply_status(&self, phase: Phase, agent_status: &sprinty_data::AgentStatus) -> Result<()> {
        for task_id in &agent_status.tasks_completed {
            let next_status = match phase {
                Phase::Implementation => ItemStatus::Implemented,
                Phase::Qa => ItemStatus::QaPassed,
                _ => ItemStatus::Done,
            };
            if let Ok(item) = self.backlog.get(task_id) {
                self.backlog.set_status(task_id, next_status)?;
                if let Some(parent_id) = item.parent_id {
                    self.backlog.roll_up(&parent_id)?;
                }
            }
        }
        Ok(())
    }

    /// Spec §4.3 "Phase completion predicates": whether `phase` has actually
    /// finished its work for `sprint_id`, independent of the loop counter.
    /// `FinalQa` has no predicate of its own here — its completion is decided
    /// by the agent's reported `final_qa_status`, handled separately below.
    fn phase_predicate_satisfied(&self, phase: Phase, sprint_id: u32) -> Result<bool> {
        match phase {
            Phase::Initialization => Ok(!self.backlog.all()?.is_empty()),
            Phase::Planning => Ok(sprinty_utils::paths::sprint_plan_exists(&self.root, sprint_id)),
            Phase::Implementation => {
                let items = self.backlog.sprint_backlog(sprint_id)?;
                Ok(!items.iter().any(|i| matches!(i.status, ItemStatus::Ready | ItemStatus::InProgress)))
            }
            Phase::Qa => {
                let items = self.backlog.sprint_backlog(sprint_id)?;
                Ok(!items.iter().any(|i| i.status == ItemStatus::Implemented))
            }
            Phase::Review => Ok(sprinty_utils::paths::sprint_review_exists(&self.root, sprint_id)),
            Phase::FinalQa => Ok(true),
        }
    }

    fn advance(&self, phase: Phase, backlog_complete: bool, agent_status: &sprinty_data::AgentStatus) -> Result<()> {
        self.sprint_machine.increment_phase_loop()?;

        if phase == Phase::Qa && self.backlog.has_qa_failed()? {
            self.sprint_machine.enter_rework(self.config.sprint.rework_limit)?;
            return Ok(());
        }

        if self.sprint_machine.loop_limit_exceeded(&self.config.sprint.max_loops)? {
            if phase == Phase::Review {
                self.sprint_machine.end_sprint(SprintOutcome::Completed)?;
            } else {
                self.sprint_machine.advance_phase()?;
            }
            return Ok(());
        }

        let sprint_id = self.sprint_machine.load()?.current_sprint;
        if !self.phase_predicate_satisfied(phase, sprint_id)? {
            return Ok(());
        }

        if phase == Phase::Review {
            if self.sprint_machine.needs_final_qa_sprint(backlog_complete, self.config.sprint.max_final_qa_attempts)? {
                self.sprint_machine.enter_final_qa()?;
            } else {
                self.sprint_machine.end_sprint(SprintOutcome::Completed)?;
            }
        } else if phase == Phase::FinalQa {
            let Some(outcome) = agent_status.final_qa_status else {
                // Agent hasn't reported a verdict yet; stay in final_qa.
                return Ok(());
            };
            self.sprint_machine.record_final_qa_outcome(outcome)?;
            if outcome == FinalQaStatus::Failed && self.sprint_machine.load()?.final_qa_attempts >= self.config.sprint.max_final_qa_attempts {
                self.sprint_machine.end_sprint(SprintOutcome::Aborted)?;
            }
        } else {
            self.sprint_machine.advance_phase()?;
        }

        Ok(())
    }
}
