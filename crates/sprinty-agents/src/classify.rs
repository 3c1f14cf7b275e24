//! Exit-code + output classification (spec §4.6 retry table). All regex
//! matches are case-insensitive; the rate-limit pattern is specific enough
//! that an output mentioning the orchestrator's own `RateLimiter` type does
//! not misfire.

use regex::RegexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    WarnNoOutput,
    Timeout,
    Killed,
    RateLimited,
    ConnectionError,
    AuthError,
    Unknown,
}

impl Classification {
    /// Whether the driver should retry this attempt at all.
    pub fn should_retry(self) -> bool {
        !matches!(self, Classification::Success | Classification::WarnNoOutput | Classification::Timeout | Classification::AuthError)
    }

    /// Whether the retry delay should be doubled before the next attempt.
    pub fn doubles_delay(self) -> bool {
        matches!(self, Classification::RateLimited)
    }
}

struct Patterns {
    set: RegexSet,
}

impl Patterns {
    fn new() -> Self {
        Self {
            set: RegexSet::new([
                r"(?i)\brate[-_ ]?limit(s|ed|ing)?\b|too many requests|429|throttl",
                r"(?i)connecterror|connection.*refused|econnrefused|network",
                r"(?i)unauthorized|authentication|invalid.*key|forbidden",
            ])
            .expect("static classification patterns are valid regex"),
        }
    }
}

thread_local! {
    static PATTERNS: Patterns = Patterns::new();
}

/// Classify a finished subprocess attempt per the spec §4.6 table, in
/// priority order: exit code first, then output content.
pub fn classify(exit_code: Option<i32>, output: &str) -> Classification {
    match exit_code {
        Some(0) => {
            if output.trim().is_empty() {
                Classification::WarnNoOutput
            } else {
                Classification::Success
            }
        }
        Some(124) => Classification::Timeout,
        Some(137) | Some(143) => Classification::Killed,
        _ => classify_output(output),
    }
}

fn classify_output(output: &str) -> Classification {
    PATTERNS.with(|p| {
        let matches: Vec<usize> = p.set.matches(output).into_iter().collect();
        if matches.contains(&0) {
            Classification::RateLimited
        } else if matches.contains(&1) {
            Classification::ConnectionError
        } else if matches.contains(&2) {
            Classification::AuthError
        } else {
            Classification::Unknown
        }
    })
}
