//! Helpers for running child processes asynchronously.
//!
//! Every child is spawned with `kill_on_drop`, so dropping the awaiting future
//! (cancellation, timeout) terminates the process.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::process::Command;
use tracing::{debug, error, instrument, warn};

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Run a command to completion and capture stdout/stderr.
///
/// With `timeout` set, the child is killed once the deadline passes and an
/// error is returned. A non-zero exit is not an error here; see
/// [`ensure_success`].
#[instrument(skip_all, fields(label = %label, timeout = ?timeout))]
pub async fn run_command(
    mut cmd: Command,
    label: &str,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("spawning child process");
    let child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).with_context(|| format!("spawn {label}"));
        }
    };

    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "command timed out, killed");
                return Err(anyhow!("{label} timed out after {limit:?}"));
            }
        },
        None => child.wait_with_output().await,
    }
    .with_context(|| format!("wait for {label}"))?;

    debug!(exit_code = ?output.status.code(), "command finished");
    Ok(CommandOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Turn a non-zero exit into an error that carries the captured stderr.
pub fn ensure_success(label: &str, output: CommandOutput) -> Result<CommandOutput> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = output.stderr_str();
    warn!(label, exit_code = ?output.status.code(), "command failed");
    match output.status.code() {
        Some(code) if stderr.is_empty() => Err(anyhow!("{label} exited with code {code}")),
        Some(code) => Err(anyhow!("{label} exited with code {code}: {stderr}")),
        None => Err(anyhow!("{label} terminated by signal")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let out = run_command(sh("echo out; echo err >&2"), "sh", None)
            .await
            .expect("run");
        assert!(out.status.success());
        assert_eq!(out.stdout_str(), "out\n");
        assert_eq!(out.stderr_str(), "err");
    }

    #[tokio::test]
    async fn non_zero_exit_surfaces_stderr() {
        let out = run_command(sh("echo boom >&2; exit 3"), "sh", None)
            .await
            .expect("run");
        let err = ensure_success("sh", out).unwrap_err();
        assert_eq!(err.to_string(), "sh exited with code 3: boom");
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let err = run_command(sh("sleep 5"), "sleeper", Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sleeper timed out"));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let cmd = Command::new("definitely-not-a-real-binary-roaster");
        let err = run_command(cmd, "ghost", None).await.unwrap_err();
        assert!(err.to_string().contains("spawn ghost"));
    }
}
