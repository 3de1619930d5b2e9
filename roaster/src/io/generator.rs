//! Generator abstraction for roast authoring.
//!
//! The [`Generator`] trait decouples the pipeline from the actual agent
//! backend (currently the `claude` CLI). Tests use scripted generators that
//! write fixed entries without spawning processes.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::io::agent_stream::{StreamMessage, user_message};
use crate::io::config::RoasterConfig;

/// Parameters for a generator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Handle being roasted.
    pub handle: String,
    /// Working copy the agent runs in and writes to.
    pub workdir: PathBuf,
    pub system_prompt: String,
    pub prompt: String,
}

/// Abstraction over roast authoring backends.
///
/// Success means only "did not fail"; the pipeline inspects the working copy
/// afterwards.
#[allow(async_fn_in_trait)]
pub trait Generator {
    async fn generate(&self, request: &GenerationRequest) -> Result<()>;
}

/// Generator that drives `claude` in stream-json mode.
#[derive(Debug, Clone)]
pub struct ClaudeGenerator {
    command: String,
    allowed_tools: Vec<String>,
    timeout: Option<Duration>,
}

impl ClaudeGenerator {
    pub fn new(command: impl Into<String>, allowed_tools: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            command: command.into(),
            allowed_tools,
            timeout,
        }
    }

    pub fn from_config(cfg: &RoasterConfig) -> Self {
        Self::new(
            cfg.agent.command.clone(),
            cfg.agent.allowed_tools.clone(),
            cfg.agent_timeout(),
        )
    }

    fn build_command(&self, request: &GenerationRequest) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--print")
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--input-format")
            .arg("stream-json")
            .arg("--system-prompt")
            .arg(&request.system_prompt);
        if !self.allowed_tools.is_empty() {
            cmd.arg("--allowed-tools").args(&self.allowed_tools);
        }
        // Allows running from inside another agent session.
        cmd.env_remove("CLAUDECODE")
            .current_dir(&request.workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn drive(&self, request: &GenerationRequest) -> Result<()> {
        let mut child = self
            .build_command(request)
            .spawn()
            .with_context(|| format!("spawn {}", self.command))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin was not piped"))?;
        let mut payload = serde_json::to_vec(&user_message(&request.prompt))
            .context("serialize prompt message")?;
        payload.push(b'\n');
        stdin.write_all(&payload).await.context("write prompt")?;
        stdin.flush().await.context("flush prompt")?;
        drop(stdin);

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr was not piped"))?;
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout was not piped"))?;
        let mut lines = BufReader::new(stdout).lines();
        let mut outcome = None;
        while let Some(line) = lines.next_line().await.context("read agent output")? {
            match StreamMessage::parse_line(&line) {
                Ok(Some(StreamMessage::Result(summary))) => outcome = Some(summary),
                Ok(Some(message)) => observe(&message),
                Ok(None) => {}
                Err(err) => warn!(err = %err, "unparseable agent output line"),
            }
        }

        let status = child.wait().await.context("wait for agent")?;
        let stderr = stderr_task.await.unwrap_or_default();
        if !status.success() {
            let stderr = stderr.trim();
            return match status.code() {
                Some(code) if stderr.is_empty() => Err(anyhow!("{} exited with code {code}", self.command)),
                Some(code) => Err(anyhow!("{} exited with code {code}: {stderr}", self.command)),
                None => Err(anyhow!("{} terminated by signal", self.command)),
            };
        }

        match outcome {
            Some(summary) if summary.is_error => bail!(
                "agent reported {}: {}",
                summary.subtype,
                summary.result.unwrap_or_default()
            ),
            Some(summary) => {
                info!(
                    turns = ?summary.num_turns,
                    cost_usd = ?summary.total_cost_usd,
                    "agent finished"
                );
                Ok(())
            }
            None => {
                warn!("agent exited without a result message");
                Ok(())
            }
        }
    }
}

impl Generator for ClaudeGenerator {
    #[instrument(skip_all, fields(handle = %request.handle, workdir = %request.workdir.display()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<()> {
        info!(command = %self.command, "starting agent");
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.drive(request))
                .await
                .map_err(|_| anyhow!("agent timed out after {limit:?}"))?,
            None => self.drive(request).await,
        }
    }
}

/// Forward agent progress to the log. Never used for control decisions.
fn observe(message: &StreamMessage) {
    for text in message.texts() {
        info!(target: "roaster::agent", "{text}");
    }
    for tool in message.tool_uses() {
        debug!(target: "roaster::agent", tool, "tool call");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    const RESULT_OK: &str = r#"{"type":"result","subtype":"success","result":"wrote it","is_error":false,"num_turns":3}"#;
    const RESULT_ERR: &str = r#"{"type":"result","subtype":"error_max_turns","result":"gave up","is_error":true}"#;
    const ASSISTANT: &str = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"reading PRs"}]}}"#;

    /// Write an executable fake agent that records stdin and prints `lines`.
    fn fake_agent(dir: &Path, lines: &[&str], exit_code: i32) -> PathBuf {
        let path = dir.join("fake-claude");
        let mut script = String::from("#!/bin/sh\ncat > prompt.jsonl\n");
        for line in lines {
            script.push_str(&format!("printf '%s\\n' '{line}'\n"));
        }
        script.push_str(&format!("echo 'fake stderr' >&2\nexit {exit_code}\n"));
        fs::write(&path, script).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    fn request(workdir: &Path) -> GenerationRequest {
        GenerationRequest {
            handle: "alice".to_string(),
            workdir: workdir.to_path_buf(),
            system_prompt: "system".to_string(),
            prompt: "roast alice".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_run_sends_prompt_on_stdin() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = fake_agent(temp.path(), &["", ASSISTANT, "garbage", RESULT_OK], 0);
        let generator = ClaudeGenerator::new(agent.display().to_string(), vec!["Write".to_string()], None);

        generator.generate(&request(temp.path())).await.expect("generate");

        let sent = fs::read_to_string(temp.path().join("prompt.jsonl")).expect("prompt");
        let value: serde_json::Value = serde_json::from_str(sent.trim()).expect("json");
        assert_eq!(value["message"]["content"][0]["text"], "roast alice");
    }

    #[tokio::test]
    async fn error_result_fails_the_attempt() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = fake_agent(temp.path(), &[RESULT_ERR], 0);
        let generator = ClaudeGenerator::new(agent.display().to_string(), Vec::new(), None);

        let err = generator.generate(&request(temp.path())).await.unwrap_err();
        assert_eq!(err.to_string(), "agent reported error_max_turns: gave up");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let temp = tempfile::tempdir().expect("tempdir");
        let agent = fake_agent(temp.path(), &[ASSISTANT], 2);
        let generator = ClaudeGenerator::new(agent.display().to_string(), Vec::new(), None);

        let err = generator.generate(&request(temp.path())).await.unwrap_err();
        assert!(err.to_string().contains("exited with code 2: fake stderr"));
    }

    #[tokio::test]
    async fn deadline_kills_a_hung_agent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("hung-claude");
        fs::write(&path, "#!/bin/sh\nexec sleep 30\n").expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        let generator = ClaudeGenerator::new(
            path.display().to_string(),
            Vec::new(),
            Some(Duration::from_millis(100)),
        );

        let err = generator.generate(&request(temp.path())).await.unwrap_err();
        assert!(err.to_string().contains("agent timed out"));
    }
}
