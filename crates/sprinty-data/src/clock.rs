use chrono::{DateTime, Utc};

/// Current instant as an ISO-8601 / RFC-3339 timestamp.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// The current UTC hour bucket key used by the rate limiter, `YYYYMMDDHH`.
pub fn hour_bucket() -> String {
    hour_bucket_of(Utc::now())
}

pub fn hour_bucket_of(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H").to_string()
}

/// Split a dense `TASK-NNN` (or `TASK-NNNa`) id into its numeric and suffix parts.
pub fn parse_task_id(id: &str) -> Option<(u32, Option<char>)> {
    let rest = id.strip_prefix("TASK-")?;
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (digits, suffix) = rest.split_at(digits_end);
    let number: u32 = digits.parse().ok()?;
    if suffix.is_empty() {
        Some((number, None))
    } else if suffix.len() == 1 {
        suffix.chars().next().filter(|c| c.is_ascii_lowercase()).map(|c| (number, Some(c)))
    } else {
        None
    }
}

/// Format a parent id, zero-padded to 3 digits.
pub fn format_task_id(number: u32) -> String {
    format!("TASK-{:03}", number)
}

/// Format a subtask id from its parent's number and a lowercase suffix letter.
pub fn format_subtask_id(number: u32, suffix: char) -> String {
    format!("TASK-{:03}{}", number, suffix)
}

/// Next unused suffix letter given the already-assigned ones, in creation order.
/// Letters are assigned densely starting from `a`.
pub fn next_suffix(existing: &[char]) -> char {
    let n = existing.len();
    (b'a' + n as u8) as char
}
