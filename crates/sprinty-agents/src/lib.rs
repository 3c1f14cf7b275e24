pub mod classify;
pub mod driver;
pub mod prompt;
pub mod status_extract;

pub use classify::Classification;
pub use driver::{run_once, run_with_retry, write_output_log, AttemptOutcome};
pub use prompt::{assemble_prompt, build_context, parse_status_block, AgentContext};
pub use status_extract::extract_and_validate;
