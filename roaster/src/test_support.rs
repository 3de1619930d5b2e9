//! Test-only helpers: scripted collaborators and a local bare dev log.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Result, anyhow};

use crate::io::config::RoasterConfig;
use crate::io::generator::{GenerationRequest, Generator};
use crate::io::remote::ContentRepo;

/// Entry document with the frontmatter fields the gate reads.
pub fn entry(handle: &str, draft: bool) -> String {
    format!(
        "+++\ntitle = \"Week in review\"\nauthor = \"{handle}\"\ndraft = {draft}\ntags = [\"weekly\"]\n\n[params]\nauthorGitHubHandle = \"{handle}\"\n+++\n\nShipped things.\n"
    )
}

/// Roast document as the agent is asked to write it.
pub fn roast(handle: &str) -> String {
    format!(
        "+++\ntitle = \"Where is {handle}'s dev log?\"\nauthor = \"roast-bot\"\ndraft = false\ntags = [\"roast\"]\n\n[params]\nauthorGitHubHandle = \"{handle}\"\n+++\n\nNo dev log this week. The PRs speak for themselves.\n"
    )
}

/// Config with zero retry delay, working copies under `root`, and a fixed
/// commit identity.
pub fn fast_config(root: &Path) -> RoasterConfig {
    let mut cfg = RoasterConfig::default();
    cfg.retry.delay_secs = 0;
    cfg.workdir.root = Some(root.join("runs"));
    cfg.git.author_name = Some("roast-bot".to_string());
    cfg.git.author_email = Some("roast-bot@example.com".to_string());
    cfg
}

/// Generator that writes a fixed roast into the working copy.
pub struct ScriptedGenerator {
    roast_of: Option<String>,
    failures: Cell<u32>,
    write_before_failing: bool,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    /// Writes `content/blog/roast-<handle>-<n>.md` on every successful call.
    pub fn writing(handle: &str) -> Self {
        Self {
            roast_of: Some(handle.to_string()),
            failures: Cell::new(0),
            write_before_failing: false,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Succeeds without writing anything.
    pub fn silent() -> Self {
        Self {
            roast_of: None,
            failures: Cell::new(0),
            write_before_failing: false,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Fail the first `n` calls.
    pub fn failing(self, n: u32) -> Self {
        self.failures.set(n);
        self
    }

    /// Fail the first `n` calls after writing their roast.
    pub fn failing_after_write(mut self, n: u32) -> Self {
        self.failures.set(n);
        self.write_before_failing = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.borrow().clone()
    }
}

impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<()> {
        self.requests.borrow_mut().push(request.clone());
        let remaining = self.failures.get();
        let fail = remaining > 0;
        if fail {
            self.failures.set(remaining - 1);
        }
        if fail && !self.write_before_failing {
            return Err(anyhow!("agent crashed"));
        }
        if let Some(handle) = &self.roast_of {
            let dir = request.workdir.join("content/blog");
            fs::create_dir_all(&dir)?;
            let name = format!("roast-{handle}-{}.md", self.calls());
            fs::write(dir.join(name), roast(handle))?;
        }
        if fail {
            return Err(anyhow!("agent reported error_during_execution"));
        }
        Ok(())
    }
}

/// Content repo that "mirrors" by writing fixed entries and records publishes.
pub struct ScriptedRepo {
    entries: Vec<(String, String)>,
    mirror_failures: Cell<u32>,
    mirrors: Cell<u32>,
    publish_error: Option<fn() -> anyhow::Error>,
    published: RefCell<Vec<String>>,
}

impl ScriptedRepo {
    pub fn with_entries(entries: Vec<(&str, String)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, body)| (name.to_string(), body))
                .collect(),
            mirror_failures: Cell::new(0),
            mirrors: Cell::new(0),
            publish_error: None,
            published: RefCell::new(Vec::new()),
        }
    }

    /// Fail the first `n` mirror calls.
    pub fn failing_mirrors(self, n: u32) -> Self {
        self.mirror_failures.set(n);
        self
    }

    /// Fail every publish with the error `make` builds.
    pub fn publish_error(mut self, make: fn() -> anyhow::Error) -> Self {
        self.publish_error = Some(make);
        self
    }

    pub fn mirrors(&self) -> u32 {
        self.mirrors.get()
    }

    /// Publish attempts, successful or not.
    pub fn publishes(&self) -> usize {
        self.published.borrow().len()
    }

    pub fn published_handles(&self) -> Vec<String> {
        self.published.borrow().clone()
    }
}

impl ContentRepo for ScriptedRepo {
    async fn mirror(&self, dest: &Path) -> Result<()> {
        self.mirrors.set(self.mirrors.get() + 1);
        let remaining = self.mirror_failures.get();
        if remaining > 0 {
            self.mirror_failures.set(remaining - 1);
            return Err(anyhow!("could not resolve host"));
        }
        let dir = dest.join("content/blog");
        fs::create_dir_all(&dir)?;
        for (name, body) in &self.entries {
            fs::write(dir.join(name), body)?;
        }
        fs::write(dest.join(".mirrored"), "")?;
        Ok(())
    }

    async fn publish(&self, _workdir: &Path, handle: &str) -> Result<()> {
        self.published.borrow_mut().push(handle.to_string());
        match self.publish_error {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }
}

/// A bare git repository seeded with dev-log entries, usable as a remote.
pub struct BareRemote {
    path: PathBuf,
}

impl BareRemote {
    /// Create `<root>/dev-log.git` whose single commit holds `entries` under
    /// `content/blog`.
    pub fn seed(root: &Path, entries: &[(&str, String)]) -> Result<Self> {
        let seed = root.join("seed");
        let blog = seed.join("content/blog");
        fs::create_dir_all(&blog)?;
        fs::write(seed.join("README.md"), "# dev log\n")?;
        for (name, body) in entries {
            fs::write(blog.join(name), body)?;
        }
        git(&seed, &["init", "--quiet"])?;
        git(&seed, &["add", "-A"])?;
        git(&seed, &["commit", "--quiet", "-m", "Seed dev log"])?;

        let path = root.join("dev-log.git");
        git(
            root,
            &["clone", "--quiet", "--bare", &seed.display().to_string(), &path.display().to_string()],
        )?;
        Ok(Self { path })
    }

    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Commit subjects on the default branch, newest first.
    pub fn subjects(&self) -> Result<Vec<String>> {
        let out = git(&self.path, &["log", "--format=%s"])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    /// Files under `content/blog` at HEAD.
    pub fn entry_names(&self) -> Result<Vec<String>> {
        let out = git(&self.path, &["ls-tree", "--name-only", "HEAD", "content/blog/"])?;
        Ok(out
            .lines()
            .filter_map(|line| line.rsplit('/').next())
            .map(str::to_string)
            .collect())
    }
}

fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(["-c", "user.name=seed", "-c", "user.email=seed@example.com"])
        .args(args)
        .current_dir(dir)
        .output()?;
    if !output.status.success() {
        return Err(anyhow!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
