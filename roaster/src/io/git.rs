//! Git adapter for the dev-log working copy.
//!
//! A small, explicit wrapper around `git` subprocess calls. Every call runs
//! with the working copy as its current directory and fails on non-zero exit.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::io::process::{CommandOutput, ensure_success, run_command};

/// Commit identity passed as `-c user.name=… -c user.email=…`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    fn config_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(name) = &self.name {
            args.push("-c".to_string());
            args.push(format!("user.name={name}"));
        }
        if let Some(email) = &self.email {
            args.push("-c".to_string());
            args.push(format!("user.email={email}"));
        }
        args
    }
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    identity: Identity,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            identity: Identity::default(),
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Clone `url` into `dest` (which must be missing or empty).
    #[instrument(skip_all, fields(url = %url, dest = %dest.display()))]
    pub async fn clone_into(url: &str, dest: &Path) -> Result<Git> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg(url).arg(dest);
        let output = run_command(cmd, "git clone", None).await?;
        ensure_success("git clone", output)?;
        debug!("clone complete");
        Ok(Git::new(dest))
    }

    /// Stage all changes (respects .gitignore).
    pub async fn add_all(&self) -> Result<()> {
        self.run_checked(&["add", "-A"]).await?;
        Ok(())
    }

    /// True if there is anything staged for commit.
    pub async fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run_checked(&["diff", "--cached", "--name-only"]).await?;
        Ok(!out.stdout_str().trim().is_empty())
    }

    /// Commit staged changes with a message.
    #[instrument(skip_all)]
    pub async fn commit(&self, message: &str) -> Result<()> {
        debug!(message, "committing staged changes");
        self.run_checked(&["commit", "-m", message]).await?;
        Ok(())
    }

    /// Push the current branch to its upstream.
    #[instrument(skip_all)]
    pub async fn push(&self) -> Result<()> {
        debug!("pushing");
        self.run_checked(&["push"]).await?;
        Ok(())
    }

    /// Return the current HEAD short SHA.
    pub async fn head_short_sha(&self, len: usize) -> Result<String> {
        let arg = format!("--short={len}");
        let out = self.run_checked(&["rev-parse", &arg, "HEAD"]).await?;
        Ok(out.stdout_str().trim().to_string())
    }

    async fn run_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        let label = format!("git {}", args.join(" "));
        let mut cmd = Command::new("git");
        cmd.args(self.identity.config_args())
            .args(args)
            .current_dir(&self.workdir);
        let output = run_command(cmd, &label, None).await?;
        ensure_success(&label, output)
    }
}
