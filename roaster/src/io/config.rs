//! Roaster configuration loaded from `roaster.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::gate::DEFAULT_WINDOW;
use crate::core::retry::RetryPolicy;
use crate::io::git::Identity;

/// Roaster configuration (TOML).
///
/// Missing sections and fields fall back to the defaults used in production
/// against the Prefect dev log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RoasterConfig {
    pub repo: RepoConfig,
    pub gate: GateConfig,
    pub retry: RetryConfig,
    pub agent: AgentConfig,
    pub git: GitConfig,
    pub workdir: WorkdirConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepoConfig {
    /// Remote cloned at the start of every run.
    pub url: String,
    /// Entry directory, relative to the working copy root.
    pub content_dir: PathBuf,
    /// Entry file extension, without the dot.
    pub extension: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            url: "https://github.com/PrefectHQ/dev-log.git".to_string(),
            content_dir: PathBuf::from("content/blog"),
            extension: "md".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Lookback window in seconds.
    pub window_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts for clone, generation and publish.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent CLI binary.
    pub command: String,
    /// Upstream `owner/name` whose merged PRs get roasted.
    pub upstream_repo: String,
    /// Author written into generated entries.
    pub bot_author: String,
    /// Filename prefix of generated entries.
    pub file_prefix: String,
    /// Tag every generated entry must carry.
    pub tag: String,
    pub allowed_tools: Vec<String>,
    /// Per-attempt deadline; 0 disables it.
    pub timeout_secs: u64,
    /// Check for a well-formed new entry before publishing.
    pub verify_output: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            upstream_repo: "PrefectHQ/prefect".to_string(),
            bot_author: "roast-bot".to_string(),
            file_prefix: "roast-".to_string(),
            tag: "roast".to_string(),
            allowed_tools: ["Bash", "Read", "WebSearch", "Write"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_secs: 30 * 60,
            verify_output: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct GitConfig {
    /// Commit author name; the ambient git config is used when unset.
    pub author_name: Option<String>,
    /// Commit author email; the ambient git config is used when unset.
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct WorkdirConfig {
    /// Parent of per-run working copies; the system temp dir when unset.
    pub root: Option<PathBuf>,
    /// Remove working copies older than this before each run. Unset keeps
    /// every working copy.
    pub retain_hours: Option<u64>,
}

impl RoasterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.repo.url.trim().is_empty() {
            return Err(anyhow!("repo.url must be set"));
        }
        if self.repo.content_dir.is_absolute() {
            return Err(anyhow!("repo.content_dir must be relative to the working copy"));
        }
        if self.repo.extension.is_empty() || self.repo.extension.starts_with('.') {
            return Err(anyhow!("repo.extension must be non-empty and without a leading dot"));
        }
        if self.gate.window_secs == 0 {
            return Err(anyhow!("gate.window_secs must be > 0"));
        }
        if self.retry.attempts == 0 {
            return Err(anyhow!("retry.attempts must be > 0"));
        }
        if self.agent.command.trim().is_empty() {
            return Err(anyhow!("agent.command must be set"));
        }
        if self.agent.file_prefix.is_empty() {
            return Err(anyhow!("agent.file_prefix must be set"));
        }
        if self.workdir.retain_hours == Some(0) {
            return Err(anyhow!("workdir.retain_hours must be > 0"));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.attempts,
            Duration::from_secs(self.retry.delay_secs),
        )
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.gate.window_secs)
    }

    pub fn agent_timeout(&self) -> Option<Duration> {
        (self.agent.timeout_secs > 0).then(|| Duration::from_secs(self.agent.timeout_secs))
    }

    pub fn identity(&self) -> Identity {
        Identity {
            name: self.git.author_name.clone(),
            email: self.git.author_email.clone(),
        }
    }

    pub fn retention(&self) -> Option<Duration> {
        self.workdir
            .retain_hours
            .map(|hours| Duration::from_secs(hours * 60 * 60))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RoasterConfig::default()`.
pub fn load_config(path: &Path) -> Result<RoasterConfig> {
    if !path.exists() {
        let cfg = RoasterConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RoasterConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
