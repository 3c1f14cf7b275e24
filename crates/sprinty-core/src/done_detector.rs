//! Done detector (spec §4.7): aggregates six independent completion signals
//! and decides, once per iteration, whether the orchestrator should exit.

use std::fs;
use std::path::{Path, PathBuf};

use sprinty_data::signals::ExitSignals;
use sprinty_data::{store, DoneDetectorConfig, Result};

pub struct DoneDetector {
    signals_path: PathBuf,
    fix_plan_path: Option<PathBuf>,
    config: DoneDetectorConfig,
}

pub struct LoopSignals {
    pub loop_number: u32,
    pub idle: bool,
    pub done_signal: bool,
    pub completion_indicator: bool,
    pub test_only: bool,
}

pub struct DetectorInputs {
    pub backlog_complete: bool,
    pub final_qa_passed: bool,
    pub agent_reports_project_done: bool,
}

impl DoneDetector {
    pub fn new(signals_path: impl Into<PathBuf>, fix_plan_path: Option<PathBuf>, config: DoneDetectorConfig) -> Self {
        Self {
            signals_path: signals_path.into(),
            fix_plan_path,
            config,
        }
    }

    pub fn record(&self, signals: LoopSignals) -> Result<ExitSignals> {
        store::update::<ExitSignals, _, _>(&self.signals_path, |s| {
            if signals.idle {
                s.idle_loops.push(signals.loop_number);
            }
            if signals.done_signal {
                s.done_signals.push(signals.loop_number);
            }
            if signals.completion_indicator {
                s.completion_indicators.push(signals.loop_number);
            }
            if signals.test_only {
                s.test_only_loops.push(signals.loop_number);
            }
            s.clone()
        })
    }

    /// `has_remaining_fix_plan_work()` — true iff the optional `@fix_plan.md`
    /// contains any `- [ ] ` line.
    pub fn has_remaining_fix_plan_work(&self) -> bool {
        let Some(path) = &self.fix_plan_path else {
            return false;
        };
        match fs::read_to_string(path) {
            Ok(content) => content.lines().any(|line| line.trim_start().starts_with("- [ ] ")),
            Err(_) => false,
        }
    }

    /// `should_exit() -> Option<reason>` (spec §4.7).
    pub fn should_exit(&self, inputs: &DetectorInputs) -> Result<Option<String>> {
        if inputs.final_qa_passed && (inputs.backlog_complete || inputs.agent_reports_project_done) {
            return Ok(Some("backlog_complete".to_string()));
        }

        let signals = store::read_json::<ExitSignals>(&self.signals_path)?;
        let fix_plan_gate = self.has_remaining_fix_plan_work();

        if fix_plan_gate {
            return Ok(None);
        }

        if ExitSignals::consecutive_tail_run(&signals.idle_loops) >= self.config.max_idle_loops {
            return Ok(Some("idle_loops".to_string()));
        }
        if ExitSignals::consecutive_tail_run(&signals.done_signals) >= self.config.max_done_signals {
            return Ok(Some("done_signals".to_string()));
        }
        if ExitSignals::consecutive_tail_run(&signals.completion_indicators) >= self.config.max_done_signals {
            return Ok(Some("completion_indicators".to_string()));
        }
        if ExitSignals::consecutive_tail_run(&signals.test_only_loops) >= self.config.max_test_only_loops {
            return Ok(Some("test_only_loops".to_string()));
        }

        Ok(None)
    }
}

/// Textual completion-indicator patterns the prompt/stdout scanner looks for
/// (spec §4.7): `PROJECT_DONE: true`, `PHASE_COMPLETE: true`, or the phrase
/// "Project complete" (case-insensitive, emoji decoration ignored).
pub fn contains_completion_indicator(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("project_done: true") || lower.contains("phase_complete: true") || lower.contains("project complete")
}

pub fn exit_signals_path(state_dir: &Path) -> PathBuf {
    state_dir.join(".exit_signals")
}

pub fn fix_plan_path(project_root: &Path) -> PathBuf {
    project_root.join("@fix_plan.md")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(config: DoneDetectorConfig, fix_plan: Option<PathBuf>) -> (tempfile::TempDir, DoneDetector) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".exit_signals");
        (dir, DoneDetector::new(path, fix_plan, config))
    }

    fn loop_signal(n: u32, idle: bool) -> LoopSignals {
        LoopSignals { loop_number: n, idle, done_signal: false, completion_indicator: false, test_only: false }
    }

    #[test]
    fn final_qa_passed_and_backlog_complete_exits_immediately() {
        let (_dir, detector) = detector(DoneDetectorConfig::default(), None);
        let reason = detector
            .should_exit(&DetectorInputs { backlog_complete: true, final_qa_passed: true, agent_reports_project_done: false })
            .unwrap();
        assert_eq!(reason, Some("backlog_complete".to_string()));
    }

    #[test]
    fn soft_signal_crosses_threshold_without_fix_plan() {
        let (_dir, detector) = detector(DoneDetectorConfig { max_idle_loops: 3, ..DoneDetectorConfig::default() }, None);
        for i in 1..=3u32 {
            detector.record(loop_signal(i, true)).unwrap();
        }
        let reason = detector
            .should_exit(&DetectorInputs { backlog_complete: false, final_qa_passed: false, agent_reports_project_done: false })
            .unwrap();
        assert_eq!(reason, Some("idle_loops".to_string()));
    }

    #[test]
    fn fix_plan_with_pending_work_blocks_soft_exit() {
        let dir = tempfile::tempdir().unwrap();
        let signals_path = dir.path().join(".exit_signals");
        let fix_plan = dir.path().join("@fix_plan.md");
        std::fs::write(&fix_plan, "- [x] done thing\n- [ ] pending thing\n").unwrap();
        let detector = DoneDetector::new(signals_path, Some(fix_plan), DoneDetectorConfig { max_idle_loops: 2, ..DoneDetectorConfig::default() });

        detector.record(loop_signal(1, true)).unwrap();
        detector.record(loop_signal(2, true)).unwrap();

        let reason = detector
            .should_exit(&DetectorInputs { backlog_complete: false, final_qa_passed: false, agent_reports_project_done: false })
            .unwrap();
        assert_eq!(reason, None);
    }

    #[test]
    fn fix_plan_fully_checked_does_not_block_exit() {
        let dir = tempfile::tempdir().unwrap();
        let signals_path = dir.path().join(".exit_signals");
        let fix_plan = dir.path().join("@fix_plan.md");
        std::fs::write(&fix_plan, "- [x] done thing\n").unwrap();
        let detector = DoneDetector::new(signals_path, Some(fix_plan), DoneDetectorConfig { max_idle_loops: 2, ..DoneDetectorConfig::default() });

        detector.record(loop_signal(1, true)).unwrap();
        detector.record(loop_signal(2, true)).unwrap();

        let reason = detector
            .should_exit(&DetectorInputs { backlog_complete: false, final_qa_passed: false, agent_reports_project_done: false })
            .unwrap();
        assert_eq!(reason, Some("idle_loops".to_string()));
    }

    #[test]
    fn completion_indicator_text_matching() {
        assert!(contains_completion_indicator("PROJECT_DONE: true"));
        assert!(contains_completion_indicator("the agent wrote phase_complete: TRUE"));
        assert!(contains_completion_indicator("🎉 Project complete!"));
        assert!(!contains_completion_indicator("still working"));
    }
}
