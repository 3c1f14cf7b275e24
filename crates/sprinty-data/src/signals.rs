use serde::{Deserialize, Serialize};

/// `.exit_signals`: the four append-only, loop-keyed signal streams the done
/// detector aggregates (spec §3, §4.7). `backlog_complete` and
/// `final_qa_passed` are derived elsewhere and are not persisted here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExitSignals {
    pub idle_loops: Vec<u32>,
    pub done_signals: Vec<u32>,
    pub completion_indicators: Vec<u32>,
    pub test_only_loops: Vec<u32>,
}

impl ExitSignals {
    /// Longest current run of consecutive loop numbers at the tail of `loops`.
    /// A stream only "crosses its threshold" on a consecutive run, not on a
    /// raw count, so a signal that came and went doesn't linger forever.
    pub fn consecutive_tail_run(loops: &[u32]) -> u32 {
        let mut run = 0u32;
        let mut prev: Option<u32> = None;
        for &loop_number in loops.iter().rev() {
            match prev {
                None => run = 1,
                Some(p) if p == loop_number + 1 => run += 1,
                Some(_) => break,
            }
            prev = Some(loop_number);
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_tail_run_counts_trailing_streak() {
        assert_eq!(ExitSignals::consecutive_tail_run(&[]), 0);
        assert_eq!(ExitSignals::consecutive_tail_run(&[1, 2, 3]), 3);
        assert_eq!(ExitSignals::consecutive_tail_run(&[1, 3, 4, 5]), 3);
        assert_eq!(ExitSignals::consecutive_tail_run(&[1, 2, 5]), 1);
    }
}
