//! Agent driver (spec §4.6): owns the subprocess lifecycle — invocation,
//! wall-clock timeout with hard-kill grace, and the classification-driven
//! retry policy. Grounded in the teacher's `execute_agent` (tokio subprocess
//! spawn, stdin/stdout piping, line-buffered capture), generalized from a
//! single hardcoded `claude-code --agent` invocation to the configurable
//! `AgentFlavor`-dispatched wire protocol from spec §6.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use sprinty_data::{AgentConfig, AgentFlavor, Result, SprintyError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::classify::{classify, Classification};

const HARD_KILL_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct AttemptOutcome {
    pub classification: Classification,
    pub exit_code: Option<i32>,
    pub output: String,
}

/// Build the CLI arguments for the configured flavor (spec §6 "Agent
/// subprocess protocol (wire-level)"): `-p [--model M] <prompt>` for
/// OpenCode, `run [--model M] <prompt>` for CursorAgent.
fn build_args(flavor: AgentFlavor, model: &Option<String>, prompt: &str) -> Vec<String> {
    let mut args = vec![match flavor {
        AgentFlavor::OpenCode => "-p".to_string(),
        AgentFlavor::CursorAgent => "run".to_string(),
    }];
    if let Some(model) = model {
        args.push("--model".to_string());
        args.push(model.clone());
    }
    args.push(prompt.to_string());
    args
}

/// Run the configured agent binary once against `prompt`, capturing combined
/// stdout+stderr, bounded by `timeout_secs` with a 30s hard-kill grace window
/// after the soft deadline.
pub async fn run_once(config: &AgentConfig, prompt: &str) -> Result<AttemptOutcome> {
    let model = config.effective_model();
    let args = build_args(config.flavor, &model, prompt);

    let mut child: Child = Command::new(&config.binary)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SprintyError::Unknown(format!("failed to spawn {}: {e}", config.binary)))?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.shutdown().await;
    }

    let mut stdout = child.stdout.take().expect("stdout piped");
    let mut stderr = child.stderr.take().expect("stderr piped");

    let drain = async {
        let mut out_buf = Vec::new();
        let mut err_buf = Vec::new();
        let (_, _, status) = tokio::join!(stdout.read_to_end(&mut out_buf), stderr.read_to_end(&mut err_buf), child.wait());
        (out_buf, err_buf, status)
    };

    let (out_buf, err_buf, status) = match timeout(Duration::from_secs(config.timeout_secs), drain).await {
        Ok((out_buf, err_buf, status)) => (out_buf, err_buf, status),
        Err(_) => {
            // Soft deadline exceeded: send the kill signal, then allow up to
            // HARD_KILL_GRACE for the process to actually exit before giving up.
            tracing::warn!("agent invocation exceeded {}s timeout, killing", config.timeout_secs);
            let _ = child.start_kill();
            let _ = timeout(HARD_KILL_GRACE, child.wait()).await;
            return Ok(AttemptOutcome {
                classification: Classification::Timeout,
                exit_code: Some(124),
                output: String::new(),
            });
        }
    };

    let status = status.map_err(|e| SprintyError::Unknown(format!("agent process error: {e}")))?;
    let exit_code = status.code();
    let combined = format!("{}{}", String::from_utf8_lossy(&out_buf), String::from_utf8_lossy(&err_buf));

    let classification = classify(exit_code, &combined);
    Ok(AttemptOutcome { classification, exit_code, output: combined })
}

/// Persist the captured output for this attempt under `AGENT_OUTPUT_DIR`.
pub async fn write_output_log(agent_output_dir: &Path, role: &str, phase: &str, sprint_id: u32, attempt: u32, output: &str) -> Result<()> {
    tokio::fs::create_dir_all(agent_output_dir).await?;
    let path = agent_output_dir.join(format!("output_{role}_{phase}_sprint{sprint_id}_attempt{attempt}.log"));
    tokio::fs::write(path, output).await?;
    Ok(())
}

/// Apply the spec §4.6 retry policy across up to `config.max_retries`
/// attempts of `run_once`, doubling the delay on `RateLimited` and failing
/// fast on `AuthError`/`Timeout`.
pub async fn run_with_retry(config: &AgentConfig, prompt: &str) -> Result<AttemptOutcome> {
    let mut delay = Duration::from_millis(config.base_delay_ms);
    let mut last_err: Option<SprintyError> = None;

    for attempt in 0..=config.max_retries {
        let outcome = run_once(config, prompt).await?;

        match outcome.classification {
            Classification::Success | Classification::WarnNoOutput => return Ok(outcome),
            Classification::Timeout => return Err(SprintyError::Timeout(config.timeout_secs)),
            Classification::AuthError => return Err(SprintyError::AuthError(outcome.output)),
            other => {
                last_err = Some(match other {
                    Classification::RateLimited => SprintyError::RateLimited,
                    Classification::ConnectionError => SprintyError::ConnectionError(outcome.output.clone()),
                    Classification::Killed => SprintyError::Killed(outcome.exit_code.unwrap_or(-1)),
                    _ => SprintyError::Unknown(outcome.output.clone()),
                });

                if attempt == config.max_retries {
                    break;
                }

                tokio::time::sleep(delay).await;
                if other.doubles_delay() {
                    delay *= 2;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| SprintyError::Unknown("agent invocation exhausted retries".to_string())))
}
