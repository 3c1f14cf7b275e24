//! Concrete scenario tests S1–S6 (spec §8 "Concrete scenarios"), each test
//! named after its scenario and driving the real engines together rather
//! than mocking their collaborators.

#[cfg(test)]
mod tests {
    use sprinty_agents::status_extract::extract_and_validate;
    use sprinty_data::sprint_state::{FinalQaStatus, Phase, SprintOutcome};
    use sprinty_data::{ItemStatus, ItemType, SprintyError};

    use crate::backlog::BacklogEngine;
    use crate::circuit_breaker::{CircuitBreaker, LoopObservation};
    use crate::sprint_machine::SprintMachine;

    struct Fixture {
        _dir: tempfile::TempDir,
        backlog: BacklogEngine,
        sprint: SprintMachine,
        breaker: CircuitBreaker,
    }

    fn fixture(project: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let backlog = BacklogEngine::new(dir.path().join("backlog.json"));
        backlog.init(project).unwrap();
        let sprint = SprintMachine::new(dir.path().join("sprint_state.json"));
        let breaker = CircuitBreaker::new(
            dir.path().join(".circuit_breaker_state"),
            dir.path().join(".circuit_breaker_history"),
            sprinty_data::CircuitBreakerConfig::default(),
        );
        Fixture { _dir: dir, backlog, sprint, breaker }
    }

    /// S1 — Happy path, one sprint, two tasks.
    #[test]
    fn s1_happy_path_one_sprint_two_tasks() {
        let f = fixture("demo");

        let t1 = f.backlog.add("Task one", ItemType::Feature, 1, 5, vec![]).unwrap();
        let t2 = f.backlog.add("Task two", ItemType::Feature, 1, 3, vec![]).unwrap();

        let state = f.sprint.start_sprint(10).unwrap();
        assert_eq!(state.current_sprint, 1);
        assert_eq!(state.current_phase, Phase::Planning);

        f.backlog.assign_to_sprint(&t1.id, 1).unwrap();
        f.backlog.assign_to_sprint(&t2.id, 1).unwrap();

        // planning -> implementation
        f.sprint.advance_phase().unwrap();
        f.backlog.set_status(&t1.id, ItemStatus::Implemented).unwrap();
        f.backlog.set_status(&t2.id, ItemStatus::Implemented).unwrap();
        assert_eq!(f.sprint.load().unwrap().current_phase, Phase::Implementation);

        // implementation -> qa
        f.sprint.advance_phase().unwrap();
        f.backlog.set_status(&t1.id, ItemStatus::QaPassed).unwrap();
        f.backlog.set_status(&t2.id, ItemStatus::QaPassed).unwrap();
        f.backlog.set_status(&t1.id, ItemStatus::Done).unwrap();
        f.backlog.set_status(&t2.id, ItemStatus::Done).unwrap();
        assert!(!f.backlog.has_qa_failed().unwrap());

        // qa -> review
        f.sprint.advance_phase().unwrap();
        assert_eq!(f.sprint.load().unwrap().current_phase, Phase::Review);

        assert!(f.backlog.is_backlog_complete().unwrap());

        assert!(f
            .sprint
            .needs_final_qa_sprint(f.backlog.is_backlog_complete().unwrap(), 3)
            .unwrap());
        f.sprint.enter_final_qa().unwrap();
        let final_state = f.sprint.record_final_qa_outcome(FinalQaStatus::Passed).unwrap();
        assert_eq!(final_state.final_qa_status, FinalQaStatus::Passed);

        assert!(f.sprint.is_project_complete(f.backlog.is_backlog_complete().unwrap()).unwrap());
        f.sprint.mark_project_done().unwrap();
        assert!(f.sprint.load().unwrap().project_done);
    }

    /// S2 — Rework cycle.
    #[test]
    fn s2_rework_cycle() {
        let f = fixture("demo");
        let t1 = f.backlog.add("Task", ItemType::Feature, 1, 3, vec![]).unwrap();

        f.sprint.start_sprint(10).unwrap();
        f.sprint.advance_phase().unwrap(); // implementation
        f.backlog.assign_to_sprint(&t1.id, 1).unwrap();
        f.sprint.advance_phase().unwrap(); // qa

        f.backlog.set_status(&t1.id, ItemStatus::QaFailed).unwrap();
        f.backlog.set_failure_reason(&t1.id, "missing tests").unwrap();
        assert!(f.backlog.has_qa_failed().unwrap());

        let exhausted = f.sprint.enter_rework(3).unwrap();
        assert!(!exhausted);
        let state = f.sprint.load().unwrap();
        assert_eq!(state.current_phase, Phase::Implementation);
        assert_eq!(state.rework_count, 1);

        f.backlog.set_status(&t1.id, ItemStatus::Implemented).unwrap();
        f.sprint.advance_phase().unwrap(); // back to qa
        f.backlog.set_status(&t1.id, ItemStatus::QaPassed).unwrap();

        // rework_count stays at 1 for this sprint: only enter_rework bumps it.
        assert_eq!(f.sprint.load().unwrap().rework_count, 1);
    }

    /// S3 — Circuit opens on stagnation.
    #[test]
    fn s3_circuit_opens_on_stagnation() {
        let f = fixture("demo");
        let stagnant = |n| LoopObservation { loop_number: n, files_changed: 0, has_errors: false };

        let s1 = f.breaker.record(stagnant(1)).unwrap();
        assert_eq!(s1.state, sprinty_data::circuit::BreakerState::Closed);
        assert_eq!(s1.consecutive_no_progress, 1);

        let s2 = f.breaker.record(stagnant(2)).unwrap();
        assert_eq!(s2.state, sprinty_data::circuit::BreakerState::HalfOpen);

        let s3 = f.breaker.record(stagnant(3)).unwrap();
        assert_eq!(s3.state, sprinty_data::circuit::BreakerState::Open);
        assert_eq!(s3.total_opens, 1);

        assert!(!f.breaker.can_execute().unwrap());
    }

    /// S4 — Subtask rollup.
    #[test]
    fn s4_subtask_rollup() {
        let f = fixture("demo");

        let parent = f.backlog.add("Big Feature", ItemType::Feature, 1, 12, vec![]).unwrap();
        assert_eq!(parent.id, "TASK-001");
        assert!(parent.needs_breakdown());

        let child_a = f.backlog.break_down(&parent.id, "A", 5, None).unwrap();
        assert_eq!(child_a.id, "TASK-001a");
        assert_eq!(f.backlog.get(&parent.id).unwrap().subtasks, vec!["TASK-001a".to_string()]);

        let child_b = f.backlog.break_down(&parent.id, "B", 7, None).unwrap();
        assert_eq!(child_b.id, "TASK-001b");
        assert!(!f.backlog.get(&parent.id).unwrap().needs_breakdown());

        f.backlog.set_status("TASK-001a", ItemStatus::QaFailed).unwrap();
        f.backlog.set_status("TASK-001b", ItemStatus::Done).unwrap();
        assert_eq!(f.backlog.roll_up(&parent.id).unwrap(), ItemStatus::QaFailed);

        f.backlog.set_status("TASK-001a", ItemStatus::Done).unwrap();
        assert_eq!(f.backlog.roll_up(&parent.id).unwrap(), ItemStatus::Done);
    }

    /// S5 — Final QA gate blocks premature exit.
    #[test]
    fn s5_final_qa_gate_blocks_premature_exit() {
        let f = fixture("demo");

        let t1 = f.backlog.add("One", ItemType::Feature, 1, 1, vec![]).unwrap();
        let t2 = f.backlog.add("Two", ItemType::Feature, 1, 1, vec![]).unwrap();
        f.backlog.set_status(&t1.id, ItemStatus::Done).unwrap();
        f.backlog.set_status(&t2.id, ItemStatus::Done).unwrap();

        f.sprint.start_sprint(10).unwrap();
        assert_eq!(f.sprint.load().unwrap().final_qa_status, FinalQaStatus::NotRun);
        assert!(!f.sprint.is_project_complete(f.backlog.is_backlog_complete().unwrap()).unwrap());
        assert!(f
            .sprint
            .needs_final_qa_sprint(f.backlog.is_backlog_complete().unwrap(), 3)
            .unwrap());

        f.sprint.enter_final_qa().unwrap();
        f.sprint.record_final_qa_outcome(FinalQaStatus::Failed).unwrap();
        let bug = f.backlog.add("Regression", ItemType::Bug, 1, 1, vec![]).unwrap();
        assert_eq!(bug.status, ItemStatus::Backlog);
        assert!(!f.sprint.is_project_complete(f.backlog.is_backlog_complete().unwrap()).unwrap());

        f.sprint.end_sprint(SprintOutcome::Aborted).unwrap();
        f.sprint.start_sprint(10).unwrap();
        f.backlog.assign_to_sprint(&bug.id, 2).unwrap();
        f.backlog.set_status(&bug.id, ItemStatus::Done).unwrap();

        assert!(f
            .sprint
            .needs_final_qa_sprint(f.backlog.is_backlog_complete().unwrap(), 3)
            .unwrap());
        f.sprint.enter_final_qa().unwrap();
        f.sprint.record_final_qa_outcome(FinalQaStatus::Passed).unwrap();
        assert!(f.sprint.is_project_complete(f.backlog.is_backlog_complete().unwrap()).unwrap());
    }

    /// S6 — Strict status rejection: a subprocess that exits 0 without ever
    /// writing `status.json` must not let the orchestrator advance the phase;
    /// it only burns the phase loop counter toward the limit.
    #[test]
    fn s6_strict_status_rejection_burns_phase_loop_not_advance() {
        let f = fixture("demo");
        f.sprint.start_sprint(10).unwrap();
        f.sprint.advance_phase().unwrap(); // implementation

        let status_path = f._dir.path().join("status.json"); // never written by the agent
        let result = extract_and_validate(&status_path, "developer");
        assert!(matches!(result, Err(SprintyError::StatusMissing(_))));

        // Orchestrator's step() treats this as a protocol violation: bump the
        // phase loop counter, leave current_phase untouched.
        f.sprint.increment_phase_loop().unwrap();
        let state = f.sprint.load().unwrap();
        assert_eq!(state.current_phase, Phase::Implementation);
        assert_eq!(state.phase_loop_count, 1);

        let limits = sprinty_data::PhaseLoopLimits { implementation: 1, ..Default::default() };
        assert!(f.sprint.loop_limit_exceeded(&limits).unwrap());
    }
}
